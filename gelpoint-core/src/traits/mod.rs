//! Hardware collaborator traits
//!
//! These traits define the interface between the process logic and the
//! board-specific sensor and actuator implementations.

pub mod actuator;
pub mod sensor;

pub use actuator::Actuators;
pub use sensor::{SensorError, Sensors};
