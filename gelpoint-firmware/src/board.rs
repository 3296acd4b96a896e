//! Board definition
//!
//! Pin map and channel counts for the two-zone RP2040 autoclave board:
//!
//! | Function            | GPIO | Peripheral     |
//! |---------------------|------|----------------|
//! | Zone 0 heater SSR   | 2    | PWM1 A         |
//! | Zone 1 heater SSR   | 3    | PWM1 B         |
//! | Vacuum pump drive   | 4    | PWM2 A         |
//! | Pressure valve      | 5    | PWM2 B         |
//! | Bag vent solenoid   | 6    | output         |
//! | Relief solenoid     | 7    | output         |
//! | Door interlock      | 10   | input, pull-up |
//! | E-stop loop         | 11   | input, pull-up |
//! | Start / Stop / Reset| 12-14| input, pull-up |
//! | Zone 0 / 1 TC amp   | 26-27| ADC0-1         |
//! | Vacuum transducer   | 28   | ADC2           |
//! | Pressure transducer | 29   | ADC3           |

use embassy_rp::gpio::Output;
use embassy_rp::pwm::{Config as PwmConfig, PwmOutput};

use gelpoint_core::config::{ControllerConfig, SafetyLimits};
use gelpoint_drivers::actuator::ActuatorBank;
use gelpoint_drivers::sensor::LinearTransducer;

pub const ZONE_COUNT: usize = 2;
pub const VACUUM_CHANNELS: usize = 1;
pub const PRESSURE_CHANNELS: usize = 1;

/// Every output on this board
pub type BoardActuators = ActuatorBank<PwmOutput<'static>, Output<'static>>;

pub const THERMOCOUPLE: LinearTransducer = LinearTransducer::ad8495();
pub const VACUUM_GAUGE: LinearTransducer = LinearTransducer::vacuum_4_20ma();
pub const PRESSURE_GAUGE: LinearTransducer = LinearTransducer::pressure_4_20ma();

pub fn controller_config() -> ControllerConfig {
    ControllerConfig {
        zone_count: ZONE_COUNT,
        vacuum_channels: VACUUM_CHANNELS,
        pressure_channels: PRESSURE_CHANNELS,
        ..ControllerConfig::default()
    }
}

pub fn safety_limits() -> SafetyLimits {
    SafetyLimits::default()
}

/// Slowest PWM the slice can run, about 7.5 Hz; zero-cross SSRs need long periods
pub fn heater_pwm_config() -> PwmConfig {
    let mut config = PwmConfig::default();
    config.divider = 255u8.into();
    config.top = u16::MAX;
    config.compare_a = 0;
    config.compare_b = 0;
    config
}

/// 1 kHz-ish drive for the pump motor controller and the proportional valve
pub fn drive_pwm_config() -> PwmConfig {
    let mut config = PwmConfig::default();
    config.divider = 2u8.into();
    config.top = 62_499;
    config.compare_a = 0;
    config.compare_b = 0;
    config
}
