//! Sensor drivers
//!
//! - Linear transducers (thermocouple amplifiers, 4-20 mA gauges)
//! - A latest-sample cache implementing the core `Sensors` trait

pub mod analog;
pub mod cache;

pub use analog::{AdcReader, AnalogChannel, LinearTransducer};
pub use cache::SensorCache;
