//! Configuration types
//!
//! Board settings, safety limits, resin constants and the cure recipe. All
//! of these are loaded before a cycle starts and stay fixed while it runs.

pub mod controller;
pub mod limits;
pub mod material;
pub mod profile;
pub mod toml;

pub use controller::*;
pub use limits::*;
pub use material::*;
pub use profile::*;
pub use toml::{parse_recipe, ParseError, Recipe};

/// Configuration validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Profile has no segments
    EmptyProfile,
    /// More segments than the profile can hold
    TooManySegments,
    /// Segment at this index has an out-of-range value
    InvalidSegment(u8),
    /// Exotherm limit missing or above the hard temperature limit
    InvalidExothermLimit,
    /// Material constants are not physically meaningful
    InvalidMaterial,
    /// Zone count outside `1..=MAX_ZONES`
    ZoneCount,
    /// Vacuum or pressure channel count out of range
    ChannelCount,
    /// Negative or non-finite loop gains
    InvalidGains,
    /// Non-positive tolerance or ramp rate
    InvalidTolerance,
    /// Zero tick period or divider
    InvalidSchedule,
    /// Safety limits unusable
    InvalidLimits,
}
