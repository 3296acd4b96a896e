//! Linear setpoint ramps

/// A setpoint ramp: move toward `target` at `rate`, then hold
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ramp {
    /// Ramp rate (°C/min)
    pub rate: f32,
    /// Ramp end point (°C)
    pub target: f32,
}

impl Ramp {
    /// Advance `value` along this ramp by `dt_s` seconds
    pub fn step(&self, value: f32, dt_s: f32) -> f32 {
        approach(value, self.target, self.rate / 60.0 * dt_s)
    }

    /// Seconds needed to ramp from `value` to the target
    pub fn remaining_s(&self, value: f32) -> f32 {
        ramp_duration_s(value, self.target, self.rate)
    }
}

/// Move `value` toward `target` by at most `step`, never overshooting
pub fn approach(value: f32, target: f32, step: f32) -> f32 {
    if !step.is_finite() || step <= 0.0 || !target.is_finite() {
        return value;
    }
    if !value.is_finite() {
        return target;
    }
    if value < target {
        (value + step).min(target)
    } else {
        (value - step).max(target)
    }
}

/// Seconds to ramp between two temperatures at `rate_per_min`
pub fn ramp_duration_s(from: f32, to: f32, rate_per_min: f32) -> f32 {
    if !(rate_per_min > 0.0) || !from.is_finite() || !to.is_finite() {
        return 0.0;
    }
    let delta = if to > from { to - from } else { from - to };
    delta / rate_per_min * 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approach_clamps_at_target() {
        assert_eq!(approach(25.0, 177.0, 2.0), 27.0);
        assert_eq!(approach(176.5, 177.0, 2.0), 177.0);
        assert_eq!(approach(100.0, 60.0, 3.0), 97.0);
        assert_eq!(approach(61.0, 60.0, 3.0), 60.0);
    }

    #[test]
    fn test_approach_rejects_bad_step() {
        assert_eq!(approach(50.0, 60.0, f32::NAN), 50.0);
        assert_eq!(approach(50.0, 60.0, -1.0), 50.0);
    }

    #[test]
    fn test_ramp_step_uses_rate_per_minute() {
        let ramp = Ramp {
            rate: 2.0,
            target: 177.0,
        };
        assert_eq!(ramp.step(25.0, 30.0), 26.0);
        assert_eq!(ramp.remaining_s(175.0), 60.0);
    }

    #[test]
    fn test_ramp_duration() {
        assert_eq!(ramp_duration_s(25.0, 177.0, 2.0), 4560.0);
        assert_eq!(ramp_duration_s(177.0, 60.0, 3.0), 2340.0);
        assert_eq!(ramp_duration_s(25.0, 177.0, 0.0), 0.0);
    }
}
