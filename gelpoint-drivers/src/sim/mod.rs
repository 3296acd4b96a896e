//! Lumped autoclave model for bench runs and integration tests

pub mod plant;

pub use plant::{SimOutputs, SimPlant};
