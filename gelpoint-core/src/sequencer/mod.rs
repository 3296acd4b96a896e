//! Recipe sequencing
//!
//! Converts the process profile into per-tick setpoints and the events that
//! drive the process state machine.

pub mod executor;
pub mod ramp;

pub use executor::{ProcessCommand, ProcessStatus, Sequencer, SequencerInputs};
pub use ramp::{approach, ramp_duration_s, Ramp};
