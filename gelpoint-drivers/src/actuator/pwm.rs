//! PWM power output
//!
//! Drives a heater SSR, the vacuum pump or the proportional pressure valve
//! from a `0..=MAX_POWER` command. The command is resolved to 0.1 % and
//! passed to the PWM channel as a duty fraction.

use embedded_hal::pwm::SetDutyCycle;
use gelpoint_core::control::MAX_POWER;

/// Per-mille resolution of the duty fraction
const DUTY_STEPS: u16 = 1000;

/// Power channel on a PWM output
pub struct PwmPower<P> {
    pwm: P,
    /// Highest power this channel will apply
    limit: f32,
    /// Last applied power
    power: f32,
}

impl<P: SetDutyCycle> PwmPower<P> {
    /// Create a channel with full range; output starts off
    pub fn new(pwm: P) -> Self {
        Self::with_limit(pwm, MAX_POWER)
    }

    /// Create a channel capped at `limit`
    pub fn with_limit(pwm: P, limit: f32) -> Self {
        let limit = if limit.is_finite() {
            limit.clamp(0.0, MAX_POWER)
        } else {
            0.0
        };
        let mut channel = Self {
            pwm,
            limit,
            power: 0.0,
        };
        let _ = channel.pwm.set_duty_cycle_fully_off();
        channel
    }

    /// Apply a power command
    ///
    /// Non-finite commands turn the output off.
    pub fn set_power(&mut self, power: f32) -> Result<(), P::Error> {
        let power = if power.is_finite() {
            power.clamp(0.0, self.limit)
        } else {
            0.0
        };

        if power <= 0.0 {
            self.pwm.set_duty_cycle_fully_off()?;
        } else {
            let steps = (power / MAX_POWER * DUTY_STEPS as f32) as u16;
            self.pwm.set_duty_cycle_fraction(steps.min(DUTY_STEPS), DUTY_STEPS)?;
        }
        self.power = power;
        Ok(())
    }

    /// Last applied power
    pub fn power(&self) -> f32 {
        self.power
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::pwm::ErrorType;

    /// Mock PWM channel with a 10-bit counter
    pub struct MockPwm {
        pub duty: u16,
    }

    impl ErrorType for MockPwm {
        type Error = Infallible;
    }

    impl SetDutyCycle for MockPwm {
        fn max_duty_cycle(&self) -> u16 {
            1024
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
            self.duty = duty;
            Ok(())
        }
    }

    #[test]
    fn test_starts_off() {
        let channel = PwmPower::new(MockPwm { duty: 500 });
        assert_eq!(channel.pwm.duty, 0);
        assert_eq!(channel.power(), 0.0);
    }

    #[test]
    fn test_power_to_duty() {
        let mut channel = PwmPower::new(MockPwm { duty: 0 });
        channel.set_power(50.0).unwrap();
        assert_eq!(channel.pwm.duty, 512);
        channel.set_power(100.0).unwrap();
        assert_eq!(channel.pwm.duty, 1024);
    }

    #[test]
    fn test_clamped_and_nan_safe() {
        let mut channel = PwmPower::with_limit(MockPwm { duty: 0 }, 80.0);
        channel.set_power(150.0).unwrap();
        assert_eq!(channel.power(), 80.0);

        channel.set_power(f32::NAN).unwrap();
        assert_eq!(channel.power(), 0.0);
        assert_eq!(channel.pwm.duty, 0);

        channel.set_power(-5.0).unwrap();
        assert_eq!(channel.pwm.duty, 0);
    }
}
