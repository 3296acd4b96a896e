//! Board-agnostic core logic for the autoclave cure controller
//!
//! This crate contains all process logic that does not depend on
//! specific hardware implementations:
//!
//! - Sensor and actuator collaborator traits
//! - Process state machine and recipe sequencer
//! - Zone, vacuum and pressure control loops
//! - Cure kinetics engine (degree of cure, viscosity, Tg)
//! - Exotherm guard and quality predictor
//! - Safety monitoring logic
//! - Configuration types and recipe parsing
//! - The cooperative tick loop tying it all together

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod control;
pub mod controller;
pub mod exotherm;
pub mod kinetics;
pub mod quality;
pub mod safety;
pub mod sequencer;
pub mod state;
pub mod telemetry;
pub mod traits;

pub use controller::{CommandError, CureController};
