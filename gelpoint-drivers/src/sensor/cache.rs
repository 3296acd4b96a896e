//! Latest-sample cache
//!
//! The sampling task writes here at its own rate; the control loop reads
//! through [`Sensors`] without ever touching an ADC. Every channel starts
//! out `NotReady` until its first sample lands.

use heapless::Vec;

use gelpoint_core::config::{MAX_PRESSURE_CHANNELS, MAX_VACUUM_CHANNELS, MAX_ZONES};
use gelpoint_core::traits::{SensorError, Sensors};

type Sample = Result<f32, SensorError>;

#[derive(Debug, Clone)]
pub struct SensorCache {
    zones: Vec<Sample, MAX_ZONES>,
    vacuum: Vec<Sample, MAX_VACUUM_CHANNELS>,
    pressure: Vec<Sample, MAX_PRESSURE_CHANNELS>,
    door_closed: bool,
}

impl SensorCache {
    /// Cache with no channels, usable in a `static` initialiser
    pub const fn empty() -> Self {
        Self {
            zones: Vec::new(),
            vacuum: Vec::new(),
            pressure: Vec::new(),
            door_closed: false,
        }
    }

    /// Cache for the given channel counts; counts beyond capacity are cut
    pub fn new(zones: usize, vacuum: usize, pressure: usize) -> Self {
        let mut cache = Self::empty();
        let _ = cache
            .zones
            .resize(zones.min(MAX_ZONES), Err(SensorError::NotReady));
        let _ = cache
            .vacuum
            .resize(vacuum.min(MAX_VACUUM_CHANNELS), Err(SensorError::NotReady));
        let _ = cache
            .pressure
            .resize(pressure.min(MAX_PRESSURE_CHANNELS), Err(SensorError::NotReady));
        cache
    }

    pub fn set_zone(&mut self, zone: usize, sample: Sample) {
        if let Some(slot) = self.zones.get_mut(zone) {
            *slot = sample;
        }
    }

    pub fn set_vacuum(&mut self, channel: usize, sample: Sample) {
        if let Some(slot) = self.vacuum.get_mut(channel) {
            *slot = sample;
        }
    }

    pub fn set_pressure(&mut self, channel: usize, sample: Sample) {
        if let Some(slot) = self.pressure.get_mut(channel) {
            *slot = sample;
        }
    }

    pub fn set_door_closed(&mut self, closed: bool) {
        self.door_closed = closed;
    }
}

fn lookup(samples: &[Sample], index: usize) -> Sample {
    samples
        .get(index)
        .copied()
        .unwrap_or(Err(SensorError::NoSuchChannel))
}

impl Sensors for SensorCache {
    fn read_zone_temperature(&mut self, zone: usize) -> Result<f32, SensorError> {
        lookup(&self.zones, zone)
    }

    fn read_vacuum(&mut self, channel: usize) -> Result<f32, SensorError> {
        lookup(&self.vacuum, channel)
    }

    fn read_pressure(&mut self, channel: usize) -> Result<f32, SensorError> {
        lookup(&self.pressure, channel)
    }

    fn door_closed(&mut self) -> bool {
        self.door_closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_until_sampled() {
        let mut cache = SensorCache::new(2, 1, 1);
        assert_eq!(cache.read_zone_temperature(0), Err(SensorError::NotReady));
        cache.set_zone(0, Ok(24.5));
        assert_eq!(cache.read_zone_temperature(0), Ok(24.5));
        assert_eq!(cache.read_zone_temperature(1), Err(SensorError::NotReady));
    }

    #[test]
    fn test_missing_channel() {
        let mut cache = SensorCache::new(2, 1, 1);
        assert_eq!(cache.read_vacuum(1), Err(SensorError::NoSuchChannel));
        cache.set_pressure(5, Ok(1.0));
        assert_eq!(cache.read_pressure(5), Err(SensorError::NoSuchChannel));
    }

    #[test]
    fn test_error_replaces_sample() {
        let mut cache = SensorCache::new(1, 1, 1);
        cache.set_vacuum(0, Ok(700.0));
        cache.set_vacuum(0, Err(SensorError::OpenCircuit));
        assert_eq!(cache.read_vacuum(0), Err(SensorError::OpenCircuit));
    }

    #[test]
    fn test_empty_cache_has_no_channels() {
        let mut cache = SensorCache::empty();
        assert_eq!(cache.read_zone_temperature(0), Err(SensorError::NoSuchChannel));
    }

    #[test]
    fn test_door_defaults_open() {
        let mut cache = SensorCache::new(1, 1, 1);
        assert!(!cache.door_closed());
        cache.set_door_closed(true);
        assert!(cache.door_closed());
    }
}
