//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the collaborator traits
//! defined in gelpoint-core:
//!
//! - Actuators (PWM heater and pump channels, solenoid valves)
//! - Sensors (thermocouple amplifiers, 4-20 mA transducers, sample cache)
//! - A simulated autoclave for bench runs and tests

#![no_std]
#![deny(unsafe_code)]

pub mod actuator;
pub mod sensor;
pub mod sim;
