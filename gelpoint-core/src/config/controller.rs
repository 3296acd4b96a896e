//! Controller configuration
//!
//! Board-level settings that do not change between recipes: channel counts,
//! loop gains, convergence tolerances and the tick schedule.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::control::PidGains;

/// Maximum temperature zones
pub const MAX_ZONES: usize = 8;

/// Maximum vacuum transducer channels
pub const MAX_VACUUM_CHANNELS: usize = 4;

/// Maximum pressure transducer channels
pub const MAX_PRESSURE_CHANNELS: usize = 2;

/// Base tick and control group divider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TickSchedule {
    /// Base tick period; the safety check runs every base tick (ms)
    pub tick_ms: u32,
    /// Control group (sequencer, loops, kinetics, quality) runs every N ticks
    pub control_every: u32,
}

impl Default for TickSchedule {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            control_every: 10,
        }
    }
}

impl TickSchedule {
    /// Schedule where every tick is a one-second control tick
    pub const fn one_hz() -> Self {
        Self {
            tick_ms: 1000,
            control_every: 1,
        }
    }

    /// Control group period in milliseconds
    pub fn control_period_ms(&self) -> u32 {
        self.tick_ms.saturating_mul(self.control_every)
    }

    /// Control group period in seconds
    pub fn control_period_s(&self) -> f32 {
        self.control_period_ms() as f32 / 1000.0
    }
}

/// Controller configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControllerConfig {
    /// Number of heated zones wired on this autoclave
    pub zone_count: usize,
    /// Number of bag vacuum transducers
    pub vacuum_channels: usize,
    /// Number of vessel pressure transducers
    pub pressure_channels: usize,
    /// Zone heater loop gains
    pub zone_gains: PidGains,
    /// Vacuum pump loop gains
    pub vacuum_gains: PidGains,
    /// Pressurisation valve loop gains
    pub pressure_gains: PidGains,
    /// Average temperature convergence band (°C)
    pub temperature_tolerance: f32,
    /// Vacuum convergence band (mmHg)
    pub vacuum_tolerance: f32,
    /// Venting completes below this vacuum (mmHg)
    pub vent_threshold: f32,
    /// Cool-down target temperature (°C)
    pub cool_down_temp: f32,
    /// Cool-down ramp rate (°C/min)
    pub cool_down_rate: f32,
    /// Measured minus predicted temperature that counts as an exotherm (°C)
    pub exotherm_margin: f32,
    /// Override setpoint is measured temperature minus this (°C)
    pub exotherm_setback: f32,
    /// Zone deviation above this raises a warning alarm (°C)
    pub deviation_warning: f32,
    /// Exponential smoothing factor for the leak-rate estimate (0..=1)
    pub leak_smoothing: f32,
    /// Tick schedule
    pub schedule: TickSchedule,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            zone_count: 4,
            vacuum_channels: 1,
            pressure_channels: 1,
            zone_gains: PidGains::new(8.0, 0.05, 20.0, 60.0),
            vacuum_gains: PidGains::new(0.8, 0.05, 0.0, 100.0),
            pressure_gains: PidGains::new(4.0, 0.1, 0.0, 80.0),
            temperature_tolerance: 2.0,
            vacuum_tolerance: 5.0,
            vent_threshold: 50.0,
            cool_down_temp: 60.0,
            cool_down_rate: 3.0,
            exotherm_margin: 5.0,
            exotherm_setback: 5.0,
            deviation_warning: 5.0,
            leak_smoothing: 0.2,
            schedule: TickSchedule::default(),
        }
    }
}

impl ControllerConfig {
    /// Check channel counts, gains and tolerances
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zone_count == 0 || self.zone_count > MAX_ZONES {
            return Err(ConfigError::ZoneCount);
        }
        if self.vacuum_channels == 0
            || self.vacuum_channels > MAX_VACUUM_CHANNELS
            || self.pressure_channels == 0
            || self.pressure_channels > MAX_PRESSURE_CHANNELS
        {
            return Err(ConfigError::ChannelCount);
        }

        for gains in [self.zone_gains, self.vacuum_gains, self.pressure_gains] {
            if !gains.is_valid() {
                return Err(ConfigError::InvalidGains);
            }
        }

        let positive = [
            self.temperature_tolerance,
            self.vacuum_tolerance,
            self.vent_threshold,
            self.cool_down_rate,
            self.exotherm_margin,
            self.exotherm_setback,
            self.deviation_warning,
        ];
        if positive.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(ConfigError::InvalidTolerance);
        }
        if !self.cool_down_temp.is_finite()
            || !(self.leak_smoothing > 0.0 && self.leak_smoothing <= 1.0)
        {
            return Err(ConfigError::InvalidTolerance);
        }

        if self.schedule.tick_ms == 0 || self.schedule.control_every == 0 {
            return Err(ConfigError::InvalidSchedule);
        }

        Ok(())
    }
}
