//! Actuator drivers
//!
//! - PWM power channels for heaters, the vacuum pump and the pressure valve
//! - Solenoid valves for the bag vent and the pressure relief
//! - An actuator bank implementing the core `Actuators` trait

pub mod bank;
pub mod pwm;
pub mod valve;

pub use bank::ActuatorBank;
pub use pwm::PwmPower;
pub use valve::SolenoidValve;
