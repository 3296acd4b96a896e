//! Embassy async tasks
//!
//! Each task runs independently and communicates via the statics in
//! `channels`.

pub mod buttons;
pub mod control;
pub mod estop;
pub mod sensors;

pub use buttons::{buttons_task, Buttons};
pub use control::control_task;
pub use estop::estop_task;
pub use sensors::{sensor_task, AnalogInputs};
