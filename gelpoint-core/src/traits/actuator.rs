//! Actuator collaborator trait

/// Fire-and-forget access to the autoclave's outputs
///
/// Power arguments are in percent, `0.0..=MAX_POWER`. Implementations hold
/// the last commanded value until told otherwise; no acknowledgement is
/// expected.
pub trait Actuators {
    /// Set heater power for one zone
    fn set_heater_power(&mut self, zone: usize, power: f32);

    /// Set vacuum pump speed
    fn set_vacuum_pump(&mut self, power: f32);

    /// Set pressurisation valve opening
    fn set_pressure_valve(&mut self, power: f32);

    /// Open (`true`) or close the bag vent valve
    fn open_vent(&mut self, open: bool);

    /// Open (`true`) or close the vessel pressure relief valve
    fn open_pressure_relief(&mut self, open: bool);
}
