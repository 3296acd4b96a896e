//! Cure recipe (process profile)
//!
//! A profile is an ordered list of segments. Each segment ramps the zones to
//! its target temperature at its heating rate, then soaks for its duration
//! while holding its vacuum and pressure targets.

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{ConfigError, SafetyLimits};

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 24;

/// Maximum segments per profile
pub const MAX_SEGMENTS: usize = 16;

/// Full vacuum, mmHg below atmosphere
pub const FULL_VACUUM_MMHG: f32 = 760.0;

/// One ramp/soak segment
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment {
    /// Zone target temperature (°C)
    pub target_temp: f32,
    /// Soak duration once the target is reached (seconds)
    pub duration_s: u32,
    /// Ramp rate toward the target (°C/min)
    pub heating_rate: f32,
    /// Bag vacuum target (mmHg below atmosphere)
    pub vacuum_target: f32,
    /// Vessel pressure target (psi gauge)
    pub pressure_target: f32,
}

impl Segment {
    /// Create a segment from minutes, the unit recipes are usually written in
    pub const fn new(
        target_temp: f32,
        duration_min: u32,
        heating_rate: f32,
        vacuum_target: f32,
        pressure_target: f32,
    ) -> Self {
        Self {
            target_temp,
            duration_s: duration_min * 60,
            heating_rate,
            vacuum_target,
            pressure_target,
        }
    }

    fn validate(&self, limits: &SafetyLimits) -> bool {
        self.target_temp.is_finite()
            && self.target_temp < limits.max_temperature
            && self.heating_rate.is_finite()
            && self.heating_rate > 0.0
            && self.vacuum_target.is_finite()
            && (0.0..=FULL_VACUUM_MMHG).contains(&self.vacuum_target)
            && self.pressure_target.is_finite()
            && self.pressure_target >= 0.0
            && self.pressure_target < limits.max_pressure
    }
}

impl Default for Segment {
    fn default() -> Self {
        Self::new(177.0, 120, 2.0, 740.0, 0.0)
    }
}

/// Process profile (recipe)
///
/// Read-only for the duration of a cycle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProcessProfile {
    /// Display name
    pub name: String<MAX_LABEL_LEN>,
    /// Segments in execution order
    pub segments: Vec<Segment, MAX_SEGMENTS>,
    /// Let the exotherm guard override zone setpoints
    pub auto_exotherm_control: bool,
    /// Zones above this temperature are pulled back during an exotherm (°C)
    pub max_exotherm_temp: f32,
}

impl Default for ProcessProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            segments: Vec::new(),
            auto_exotherm_control: true,
            max_exotherm_temp: 190.0,
        }
    }
}

impl ProcessProfile {
    /// Create a profile with a single segment
    pub fn single(segment: Segment) -> Self {
        let mut profile = Self::default();
        // Capacity is non-zero
        let _ = profile.segments.push(segment);
        profile
    }

    /// Append a segment
    pub fn push_segment(&mut self, segment: Segment) -> Result<(), ConfigError> {
        self.segments
            .push(segment)
            .map_err(|_| ConfigError::TooManySegments)
    }

    /// Get a segment by index
    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the profile has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sum of all soak durations (seconds)
    pub fn total_soak_s(&self) -> u32 {
        self.segments
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.duration_s))
    }

    /// Check the profile against the hard safety limits
    pub fn validate(&self, limits: &SafetyLimits) -> Result<(), ConfigError> {
        if self.segments.is_empty() {
            return Err(ConfigError::EmptyProfile);
        }

        for (index, segment) in self.segments.iter().enumerate() {
            if !segment.validate(limits) {
                return Err(ConfigError::InvalidSegment(index as u8));
            }
        }

        if !self.max_exotherm_temp.is_finite() || self.max_exotherm_temp >= limits.max_temperature
        {
            return Err(ConfigError::InvalidExothermLimit);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile_rejected() {
        let profile = ProcessProfile::default();
        assert_eq!(
            profile.validate(&SafetyLimits::default()),
            Err(ConfigError::EmptyProfile)
        );
    }

    #[test]
    fn test_single_segment_valid() {
        let profile = ProcessProfile::single(Segment::default());
        assert_eq!(profile.validate(&SafetyLimits::default()), Ok(()));
        assert_eq!(profile.total_soak_s(), 120 * 60);
    }

    #[test]
    fn test_segment_above_limit() {
        let mut profile = ProcessProfile::single(Segment::default());
        profile
            .push_segment(Segment::new(230.0, 60, 1.0, 740.0, 0.0))
            .unwrap();
        assert_eq!(
            profile.validate(&SafetyLimits::default()),
            Err(ConfigError::InvalidSegment(1))
        );
    }

    #[test]
    fn test_zero_heating_rate_rejected() {
        let profile = ProcessProfile::single(Segment::new(120.0, 10, 0.0, 700.0, 0.0));
        assert_eq!(
            profile.validate(&SafetyLimits::default()),
            Err(ConfigError::InvalidSegment(0))
        );
    }

    #[test]
    fn test_vacuum_beyond_full() {
        let profile = ProcessProfile::single(Segment::new(120.0, 10, 1.0, 800.0, 0.0));
        assert!(profile.validate(&SafetyLimits::default()).is_err());
    }

    #[test]
    fn test_capacity() {
        let mut profile = ProcessProfile::default();
        for _ in 0..MAX_SEGMENTS {
            profile.push_segment(Segment::default()).unwrap();
        }
        assert_eq!(
            profile.push_segment(Segment::default()),
            Err(ConfigError::TooManySegments)
        );
    }
}
