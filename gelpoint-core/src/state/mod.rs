//! Process state machine
//!
//! Defines the authoritative runtime behavior of the autoclave.
//! The state machine is explicit, finite, and deterministic.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::{FaultKind, ProcessState};
