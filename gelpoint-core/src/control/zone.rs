//! Per-zone temperature loop

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::pid::{pid_step, PidGains, PidState};

/// Snapshot of one heated zone
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ZoneState {
    /// Last good temperature sample (°C)
    pub measured_temp: f32,
    /// Active setpoint (°C)
    pub setpoint: f32,
    /// Heater command, `0..=MAX_POWER`
    pub power_output: f32,
}

/// Closed-loop heater controller for one zone
///
/// The loop never writes its own setpoint; the sequencer and the exotherm
/// guard do that through [`ZoneLoop::set_setpoint`].
#[derive(Debug, Clone, Default)]
pub struct ZoneLoop {
    state: ZoneState,
    pid: PidState,
}

impl ZoneLoop {
    /// Create a loop seeded with an initial measurement
    pub fn new(measured_temp: f32) -> Self {
        Self {
            state: ZoneState {
                measured_temp,
                setpoint: measured_temp,
                power_output: 0.0,
            },
            pid: PidState::default(),
        }
    }

    pub fn state(&self) -> &ZoneState {
        &self.state
    }

    pub fn measured(&self) -> f32 {
        self.state.measured_temp
    }

    pub fn setpoint(&self) -> f32 {
        self.state.setpoint
    }

    /// Store a fresh sample
    pub fn record_measurement(&mut self, temp: f32) {
        self.state.measured_temp = temp;
    }

    /// Write the active setpoint
    pub fn set_setpoint(&mut self, setpoint: f32) {
        if setpoint.is_finite() {
            self.state.setpoint = setpoint;
        }
    }

    /// Absolute deviation between measurement and setpoint
    pub fn deviation(&self) -> f32 {
        let d = self.state.measured_temp - self.state.setpoint;
        if d < 0.0 {
            -d
        } else {
            d
        }
    }

    /// Force the output off and clear the loop memory
    pub fn disable(&mut self) {
        self.state.power_output = 0.0;
        self.pid = PidState::default();
    }

    /// Run one control step and return the heater command
    ///
    /// Over-temperature forces zero output regardless of the PID.
    pub fn update(&mut self, gains: &PidGains, max_temperature: f32, dt_s: f32) -> f32 {
        if self.is_over_temperature(max_temperature) {
            self.disable();
            return 0.0;
        }

        let error = self.state.setpoint - self.state.measured_temp;
        let (output, pid) = pid_step(gains, self.pid, error, dt_s);
        self.pid = pid;
        self.state.power_output = output;
        output
    }

    pub fn is_over_temperature(&self, max_temperature: f32) -> bool {
        self.state.measured_temp > max_temperature
    }
}

/// Mean of the zone measurements
pub fn average_temperature(zones: &[ZoneLoop]) -> f32 {
    if zones.is_empty() {
        return f32::NAN;
    }
    let sum: f32 = zones.iter().map(|z| z.measured()).sum();
    sum / zones.len() as f32
}

/// Lowest and highest zone measurement
pub fn temperature_spread(zones: &[ZoneLoop]) -> (f32, f32) {
    zones.iter().map(|z| z.measured()).fold(
        (f32::INFINITY, f32::NEG_INFINITY),
        |(lo, hi), t| (lo.min(t), hi.max(t)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAINS: PidGains = PidGains::new(10.0, 0.0, 0.0, 0.0);

    #[test]
    fn test_heats_below_setpoint() {
        let mut zone = ZoneLoop::new(25.0);
        zone.set_setpoint(30.0);
        assert_eq!(zone.update(&GAINS, 220.0, 1.0), 50.0);
        assert_eq!(zone.state().power_output, 50.0);
    }

    #[test]
    fn test_over_temperature_forces_zero() {
        let mut zone = ZoneLoop::new(25.0);
        zone.set_setpoint(300.0);
        zone.record_measurement(221.0);
        assert_eq!(zone.update(&GAINS, 220.0, 1.0), 0.0);
        assert!(zone.is_over_temperature(220.0));
    }

    #[test]
    fn test_nan_setpoint_ignored() {
        let mut zone = ZoneLoop::new(25.0);
        zone.set_setpoint(100.0);
        zone.set_setpoint(f32::NAN);
        assert_eq!(zone.setpoint(), 100.0);
    }

    #[test]
    fn test_nan_measurement_zero_output() {
        let mut zone = ZoneLoop::new(25.0);
        zone.set_setpoint(100.0);
        zone.record_measurement(f32::NAN);
        assert_eq!(zone.update(&GAINS, 220.0, 1.0), 0.0);
    }

    #[test]
    fn test_average_and_spread() {
        let zones = [ZoneLoop::new(20.0), ZoneLoop::new(30.0), ZoneLoop::new(40.0)];
        assert_eq!(average_temperature(&zones), 30.0);
        assert_eq!(temperature_spread(&zones), (20.0, 40.0));
    }

    #[test]
    fn test_deviation_is_absolute() {
        let mut zone = ZoneLoop::new(180.0);
        zone.set_setpoint(177.0);
        assert_eq!(zone.deviation(), 3.0);
        zone.record_measurement(170.0);
        assert_eq!(zone.deviation(), 7.0);
    }
}
