//! Safety monitoring
//!
//! Monitors the emergency-stop latch, door interlock, temperature, pressure,
//! leak rate and sensor health, and keeps the active alarm list.

pub mod alarm;
pub mod estop;
pub mod monitor;

pub use alarm::{Alarm, AlarmKind, AlarmList, SensorChannel, Severity, MAX_ALARMS};
pub use estop::EstopLatch;
pub use monitor::{SafetyInputs, SafetyMonitor, SafetyReport, SafetyStatus};
