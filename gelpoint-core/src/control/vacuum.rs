//! Vacuum and pressure loops
//!
//! The bag vacuum pump and the vessel pressurisation valve each run their
//! own PID. The vacuum loop also estimates the bag leak rate.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::pid::{pid_step, PidGains, PidState};

/// Snapshot of the vacuum and pressure channels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VacuumPressureState {
    /// Average bag vacuum (mmHg below atmosphere)
    pub vacuum_measured: f32,
    /// Active vacuum setpoint (mmHg)
    pub vacuum_setpoint: f32,
    /// Vessel gauge pressure (psi)
    pub pressure_measured: f32,
    /// Active pressure setpoint (psi)
    pub pressure_setpoint: f32,
    /// Smoothed rate of vacuum loss (mmHg/min)
    pub leak_rate: f32,
    /// Leak rate below the alarm threshold
    pub integrity: bool,
    /// Vacuum pump command
    pub pump_output: f32,
    /// Pressurisation valve command
    pub valve_output: f32,
}

/// Combined vacuum/pressure controller
#[derive(Debug, Clone)]
pub struct VacuumPressureLoop {
    state: VacuumPressureState,
    vacuum_pid: PidState,
    pressure_pid: PidState,
    prev_vacuum: Option<f32>,
}

impl Default for VacuumPressureLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl VacuumPressureLoop {
    pub fn new() -> Self {
        Self {
            state: VacuumPressureState {
                integrity: true,
                ..VacuumPressureState::default()
            },
            vacuum_pid: PidState::default(),
            pressure_pid: PidState::default(),
            prev_vacuum: None,
        }
    }

    pub fn state(&self) -> &VacuumPressureState {
        &self.state
    }

    /// Store fresh averaged samples
    pub fn record_measurement(&mut self, vacuum: f32, pressure: f32) {
        self.state.vacuum_measured = vacuum;
        self.state.pressure_measured = pressure;
    }

    /// Write the active setpoints
    pub fn set_setpoints(&mut self, vacuum: f32, pressure: f32) {
        if vacuum.is_finite() {
            self.state.vacuum_setpoint = vacuum.max(0.0);
        }
        if pressure.is_finite() {
            self.state.pressure_setpoint = pressure.max(0.0);
        }
    }

    /// Force both outputs off and clear loop memory and leak history
    pub fn disable(&mut self) {
        self.state.pump_output = 0.0;
        self.state.valve_output = 0.0;
        self.state.vacuum_setpoint = 0.0;
        self.state.pressure_setpoint = 0.0;
        self.state.leak_rate = 0.0;
        self.state.integrity = true;
        self.vacuum_pid = PidState::default();
        self.pressure_pid = PidState::default();
        self.prev_vacuum = None;
    }

    /// Run one control step and return `(pump, valve)` commands
    pub fn update(
        &mut self,
        vacuum_gains: &PidGains,
        pressure_gains: &PidGains,
        leak_threshold: f32,
        smoothing: f32,
        dt_s: f32,
    ) -> (f32, f32) {
        self.update_leak_rate(leak_threshold, smoothing, dt_s);

        let pump = if self.state.vacuum_setpoint > 0.0 {
            let error = self.state.vacuum_setpoint - self.state.vacuum_measured;
            let (output, pid) = pid_step(vacuum_gains, self.vacuum_pid, error, dt_s);
            self.vacuum_pid = pid;
            output
        } else {
            self.vacuum_pid = PidState::default();
            0.0
        };

        let valve = if self.state.pressure_setpoint > 0.0 {
            let error = self.state.pressure_setpoint - self.state.pressure_measured;
            let (output, pid) = pid_step(pressure_gains, self.pressure_pid, error, dt_s);
            self.pressure_pid = pid;
            output
        } else {
            self.pressure_pid = PidState::default();
            0.0
        };

        self.state.pump_output = pump;
        self.state.valve_output = valve;
        (pump, valve)
    }

    /// Smoothed rate of vacuum loss while a setpoint is held
    fn update_leak_rate(&mut self, threshold: f32, smoothing: f32, dt_s: f32) {
        let vacuum = self.state.vacuum_measured;

        if self.state.vacuum_setpoint <= 0.0 || !vacuum.is_finite() || dt_s <= 0.0 {
            self.state.leak_rate = 0.0;
            self.state.integrity = true;
            self.prev_vacuum = None;
            return;
        }

        if let Some(prev) = self.prev_vacuum {
            let loss_per_min = ((prev - vacuum) / dt_s * 60.0).max(0.0);
            self.state.leak_rate += smoothing * (loss_per_min - self.state.leak_rate);
        }
        self.prev_vacuum = Some(vacuum);
        self.state.integrity = self.state.leak_rate < threshold;
    }
}

/// Mean of the finite values in a sample set
pub fn channel_average(samples: &[f32]) -> f32 {
    let (sum, n) = samples
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0f32, 0u32), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f32::NAN
    } else {
        sum / n as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VAC: PidGains = PidGains::new(1.0, 0.0, 0.0, 0.0);
    const PRES: PidGains = PidGains::new(2.0, 0.0, 0.0, 0.0);

    fn run(l: &mut VacuumPressureLoop) -> (f32, f32) {
        l.update(&VAC, &PRES, 5.0, 0.5, 1.0)
    }

    #[test]
    fn test_outputs_off_without_setpoint() {
        let mut l = VacuumPressureLoop::new();
        l.record_measurement(0.0, 0.0);
        assert_eq!(run(&mut l), (0.0, 0.0));
    }

    #[test]
    fn test_pump_drives_toward_setpoint() {
        let mut l = VacuumPressureLoop::new();
        l.set_setpoints(740.0, 20.0);
        l.record_measurement(700.0, 10.0);
        assert_eq!(run(&mut l), (40.0, 20.0));
    }

    #[test]
    fn test_steady_vacuum_has_no_leak() {
        let mut l = VacuumPressureLoop::new();
        l.set_setpoints(740.0, 0.0);
        for _ in 0..10 {
            l.record_measurement(740.0, 0.0);
            run(&mut l);
        }
        assert_eq!(l.state().leak_rate, 0.0);
        assert!(l.state().integrity);
    }

    #[test]
    fn test_falling_vacuum_raises_leak_rate() {
        let mut l = VacuumPressureLoop::new();
        l.set_setpoints(740.0, 0.0);
        let mut vacuum = 740.0;
        for _ in 0..20 {
            l.record_measurement(vacuum, 0.0);
            run(&mut l);
            // 0.5 mmHg/s = 30 mmHg/min
            vacuum -= 0.5;
        }
        assert!(l.state().leak_rate > 25.0);
        assert!(!l.state().integrity);
    }

    #[test]
    fn test_leak_cleared_when_setpoint_dropped() {
        let mut l = VacuumPressureLoop::new();
        l.set_setpoints(740.0, 0.0);
        l.record_measurement(740.0, 0.0);
        run(&mut l);
        l.record_measurement(700.0, 0.0);
        run(&mut l);
        assert!(l.state().leak_rate > 0.0);

        l.set_setpoints(0.0, 0.0);
        run(&mut l);
        assert_eq!(l.state().leak_rate, 0.0);
        assert!(l.state().integrity);
    }

    #[test]
    fn test_channel_average_skips_nan() {
        assert_eq!(channel_average(&[700.0, f32::NAN, 720.0]), 710.0);
        assert!(channel_average(&[]).is_nan());
    }
}
