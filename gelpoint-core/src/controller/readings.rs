//! Last-good sensor readings
//!
//! Every channel keeps its most recent good sample. A read that fails or
//! returns a non-finite value leaves the sample alone and extends that
//! channel's bad-sample streak.

use heapless::Vec;

use crate::config::{ControllerConfig, MAX_PRESSURE_CHANNELS, MAX_VACUUM_CHANNELS, MAX_ZONES};
use crate::control::{channel_average, ZoneLoop};
use crate::safety::SensorChannel;
use crate::traits::{SensorError, Sensors};

/// Cached channel values and their health
#[derive(Debug, Clone)]
pub struct Readings {
    vacuum: Vec<f32, MAX_VACUUM_CHANNELS>,
    pressure: Vec<f32, MAX_PRESSURE_CHANNELS>,
    zone_streaks: Vec<u16, MAX_ZONES>,
    vacuum_streaks: Vec<u16, MAX_VACUUM_CHANNELS>,
    pressure_streaks: Vec<u16, MAX_PRESSURE_CHANNELS>,
    door_closed: bool,
}

impl Readings {
    /// Empty readings for the configured channel counts
    ///
    /// Channels read as NaN until their first good sample.
    pub fn new(config: &ControllerConfig) -> Self {
        let mut readings = Self {
            vacuum: Vec::new(),
            pressure: Vec::new(),
            zone_streaks: Vec::new(),
            vacuum_streaks: Vec::new(),
            pressure_streaks: Vec::new(),
            door_closed: false,
        };
        // Counts were validated against the capacities
        let _ = readings.vacuum.resize(config.vacuum_channels, f32::NAN);
        let _ = readings.pressure.resize(config.pressure_channels, f32::NAN);
        let _ = readings.zone_streaks.resize(config.zone_count, 0);
        let _ = readings.vacuum_streaks.resize(config.vacuum_channels, 0);
        let _ = readings.pressure_streaks.resize(config.pressure_channels, 0);
        readings
    }

    /// Sample every channel once
    ///
    /// Zone samples go straight into the zone loops.
    pub fn refresh<S: Sensors>(&mut self, sensors: &mut S, zones: &mut [ZoneLoop]) {
        for (i, (zone, streak)) in zones
            .iter_mut()
            .zip(self.zone_streaks.iter_mut())
            .enumerate()
        {
            let mut value = zone.measured();
            sample(sensors.read_zone_temperature(i), &mut value, streak);
            zone.record_measurement(value);
        }

        for (i, (value, streak)) in self
            .vacuum
            .iter_mut()
            .zip(self.vacuum_streaks.iter_mut())
            .enumerate()
        {
            sample(sensors.read_vacuum(i), value, streak);
        }

        for (i, (value, streak)) in self
            .pressure
            .iter_mut()
            .zip(self.pressure_streaks.iter_mut())
            .enumerate()
        {
            sample(sensors.read_pressure(i), value, streak);
        }

        self.door_closed = sensors.door_closed();
    }

    /// Average bag vacuum (mmHg)
    pub fn vacuum_average(&self) -> f32 {
        channel_average(&self.vacuum)
    }

    /// Average vessel pressure (psi)
    pub fn pressure_average(&self) -> f32 {
        channel_average(&self.pressure)
    }

    /// Highest vessel pressure reading; NaN before the first good sample
    pub fn pressure_max(&self) -> f32 {
        self.pressure
            .iter()
            .copied()
            .filter(|p| p.is_finite())
            .fold(f32::NAN, |acc, p| if acc.is_nan() || p > acc { p } else { acc })
    }

    pub fn door_closed(&self) -> bool {
        self.door_closed
    }

    /// Longest current bad-sample run on any channel
    pub fn worst_streak(&self) -> u16 {
        self.streaks().map(|(_, s)| s).max().unwrap_or(0)
    }

    /// Bad-sample run per channel
    pub fn streaks(&self) -> impl Iterator<Item = (SensorChannel, u16)> + '_ {
        let zones = self
            .zone_streaks
            .iter()
            .enumerate()
            .map(|(i, s)| (SensorChannel::Zone(i as u8), *s));
        let vacuum = self
            .vacuum_streaks
            .iter()
            .enumerate()
            .map(|(i, s)| (SensorChannel::Vacuum(i as u8), *s));
        let pressure = self
            .pressure_streaks
            .iter()
            .enumerate()
            .map(|(i, s)| (SensorChannel::Pressure(i as u8), *s));
        zones.chain(vacuum).chain(pressure)
    }
}

fn sample(result: Result<f32, SensorError>, value: &mut f32, streak: &mut u16) {
    match result {
        Ok(v) if v.is_finite() => {
            *value = v;
            *streak = 0;
        }
        _ => *streak = streak.saturating_add(1),
    }
}
