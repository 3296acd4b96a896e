//! Closed-loop control
//!
//! Zone heater loops and the vacuum/pressure loops, all built on the same
//! pure PID step.

pub mod pid;
pub mod vacuum;
pub mod zone;

pub use pid::{pid_step, PidGains, PidState};
pub use vacuum::{channel_average, VacuumPressureLoop, VacuumPressureState};
pub use zone::{average_temperature, temperature_spread, ZoneLoop, ZoneState};

/// Full-scale actuator command (percent)
pub const MAX_POWER: f32 = 100.0;
