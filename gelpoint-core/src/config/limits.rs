//! Hard safety limits
//!
//! These are enforced by the safety monitor every tick, independent of the
//! recipe and the control loops.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Safety thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SafetyLimits {
    /// Any zone above this is an over-temperature fault (°C)
    pub max_temperature: f32,
    /// Vessel pressure above this opens relief and faults (psi)
    pub max_pressure: f32,
    /// Leak rate above this raises a leak alarm (mmHg/min)
    pub leak_threshold: f32,
    /// Consecutive control ticks with a leak alarm before it becomes a fault
    pub leak_escalation_count: u16,
    /// Consecutive bad samples on one channel before it becomes a fault;
    /// samples are taken every base tick
    pub sensor_fault_limit: u16,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_temperature: 220.0,
            max_pressure: 100.0,
            leak_threshold: 5.0,
            leak_escalation_count: 10,
            sensor_fault_limit: 30,
        }
    }
}

impl SafetyLimits {
    /// Check the limits are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [self.max_temperature, self.max_pressure, self.leak_threshold];
        if positive.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(ConfigError::InvalidLimits);
        }
        if self.leak_escalation_count == 0 || self.sensor_fault_limit == 0 {
            return Err(ConfigError::InvalidLimits);
        }
        Ok(())
    }
}
