//! Actuator bank
//!
//! Owns every output of one autoclave and implements the core
//! [`Actuators`] trait over them. Writes are fire-and-forget; a failed
//! write is counted and the next tick writes again.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use heapless::Vec;

use gelpoint_core::config::MAX_ZONES;
use gelpoint_core::traits::Actuators;

use super::pwm::PwmPower;
use super::valve::SolenoidValve;

/// All outputs of one autoclave
///
/// Every PWM output shares one channel type and every valve one pin type,
/// which matches how HALs hand out PWM slices and GPIO outputs.
pub struct ActuatorBank<P, G> {
    heaters: Vec<PwmPower<P>, MAX_ZONES>,
    pump: PwmPower<P>,
    pressure_valve: PwmPower<P>,
    vent: SolenoidValve<G>,
    relief: SolenoidValve<G>,
    write_errors: u32,
}

impl<P: SetDutyCycle, G: OutputPin> ActuatorBank<P, G> {
    pub fn new(
        heaters: Vec<PwmPower<P>, MAX_ZONES>,
        pump: PwmPower<P>,
        pressure_valve: PwmPower<P>,
        vent: SolenoidValve<G>,
        relief: SolenoidValve<G>,
    ) -> Self {
        Self {
            heaters,
            pump,
            pressure_valve,
            vent,
            relief,
            write_errors: 0,
        }
    }

    pub fn heater_power(&self, zone: usize) -> Option<f32> {
        self.heaters.get(zone).map(|h| h.power())
    }

    pub fn pump_power(&self) -> f32 {
        self.pump.power()
    }

    pub fn valve_power(&self) -> f32 {
        self.pressure_valve.power()
    }

    pub fn vent_open(&self) -> bool {
        self.vent.is_open()
    }

    pub fn relief_open(&self) -> bool {
        self.relief.is_open()
    }

    /// Failed output writes since power-up
    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    fn note<E>(&mut self, result: Result<(), E>) {
        if result.is_err() {
            self.write_errors = self.write_errors.saturating_add(1);
        }
    }
}

impl<P: SetDutyCycle, G: OutputPin> Actuators for ActuatorBank<P, G> {
    fn set_heater_power(&mut self, zone: usize, power: f32) {
        if let Some(heater) = self.heaters.get_mut(zone) {
            let result = heater.set_power(power);
            self.note(result);
        }
    }

    fn set_vacuum_pump(&mut self, power: f32) {
        let result = self.pump.set_power(power);
        self.note(result);
    }

    fn set_pressure_valve(&mut self, power: f32) {
        let result = self.pressure_valve.set_power(power);
        self.note(result);
    }

    fn open_vent(&mut self, open: bool) {
        let result = self.vent.set_open(open);
        self.note(result);
    }

    fn open_pressure_relief(&mut self, open: bool) {
        let result = self.relief.set_open(open);
        self.note(result);
    }
}
