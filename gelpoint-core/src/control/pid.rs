//! PID step function
//!
//! A PID step is a pure function of the gains, the previous loop state and
//! the current error. Callers own the state and store the returned copy.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::MAX_POWER;

/// PID coefficients
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PidGains {
    /// Proportional gain (Kp), output per unit error
    pub kp: f32,
    /// Integral gain (Ki), output per unit error-second
    pub ki: f32,
    /// Derivative gain (Kd), output per unit error/second
    pub kd: f32,
    /// Integral windup limit, in output units
    ///
    /// The accumulated integral term never exceeds ± this value.
    pub integral_limit: f32,
}

impl PidGains {
    pub const fn new(kp: f32, ki: f32, kd: f32, integral_limit: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral_limit,
        }
    }

    /// Check all coefficients are finite and non-negative
    pub fn is_valid(&self) -> bool {
        [self.kp, self.ki, self.kd, self.integral_limit]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// PID loop memory between steps
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PidState {
    /// Accumulated integral term (output units)
    pub integral: f32,
    /// Error at the previous step; `None` right after a reset
    pub prev_error: Option<f32>,
}

/// Run one PID step
///
/// Returns the output clamped to `[0, MAX_POWER]` and the new loop state.
/// A non-finite error or sample interval yields zero output and hands the
/// previous state back untouched.
pub fn pid_step(gains: &PidGains, state: PidState, error: f32, dt_s: f32) -> (f32, PidState) {
    if !error.is_finite() || !dt_s.is_finite() || dt_s <= 0.0 {
        return (0.0, state);
    }

    let p_term = gains.kp * error;

    // Anti-windup: clamp integral
    let limit = if gains.integral_limit > 0.0 {
        gains.integral_limit
    } else {
        0.0
    };
    let integral = (state.integral + gains.ki * error * dt_s).clamp(-limit, limit);

    // Derivative on error; zero on the first step after a reset
    let d_term = match state.prev_error {
        Some(prev) => gains.kd * (error - prev) / dt_s,
        None => 0.0,
    };

    let raw = p_term + integral + d_term;
    let output = if raw.is_finite() {
        raw.clamp(0.0, MAX_POWER)
    } else {
        0.0
    };

    (
        output,
        PidState {
            integral,
            prev_error: Some(error),
        },
    )
}
