//! Exotherm guard
//!
//! Tracks, per zone, where the temperature should be if it only followed the
//! active ramp. A zone running hotter than that prediction by more than the
//! margin is self-heating from the curing reaction. With automatic exotherm
//! control on, zones above the recipe's exotherm limit get their setpoint
//! pulled below their measured temperature until the reaction subsides.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::MAX_ZONES;
use crate::control::ZoneLoop;
use crate::sequencer::Ramp;

/// Guard settings for one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardSettings {
    /// Override setpoints when an exotherm is detected
    pub auto_control: bool,
    /// Zones above this are pulled back (°C)
    pub max_exotherm_temp: f32,
    /// Measured minus predicted that counts as an exotherm (°C)
    pub margin: f32,
    /// Override setpoint sits this far below the measurement (°C)
    pub setback: f32,
}

/// Result of one guard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExothermStatus {
    /// Some zone is running hotter than predicted
    pub detected: bool,
    /// Bit `i` set when zone `i`'s setpoint was overridden
    pub overridden: u8,
}

impl ExothermStatus {
    pub fn is_overridden(&self, zone: usize) -> bool {
        zone < 8 && self.overridden & (1 << zone) != 0
    }
}

/// Per-zone temperature prediction and setpoint override
#[derive(Debug, Clone, Default)]
pub struct ExothermGuard {
    predicted: Vec<f32, MAX_ZONES>,
    status: ExothermStatus,
}

impl ExothermGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart the prediction from the current measurements
    pub fn seed(&mut self, zones: &[ZoneLoop]) {
        self.predicted.clear();
        for zone in zones.iter().take(MAX_ZONES) {
            // Capacity matches the take() above
            let _ = self.predicted.push(zone.measured());
        }
        self.status = ExothermStatus::default();
    }

    pub fn predicted(&self) -> &[f32] {
        &self.predicted
    }

    pub fn status(&self) -> ExothermStatus {
        self.status
    }

    /// Advance the prediction and apply overrides
    ///
    /// Runs after the sequencer has written this tick's setpoints.
    pub fn update(
        &mut self,
        zones: &mut [ZoneLoop],
        ramp: Ramp,
        settings: &GuardSettings,
        dt_s: f32,
    ) -> ExothermStatus {
        if self.predicted.len() != zones.len() {
            self.seed(zones);
        }

        for predicted in self.predicted.iter_mut() {
            *predicted = ramp.step(*predicted, dt_s);
        }

        let detected = zones
            .iter()
            .zip(self.predicted.iter())
            .any(|(zone, predicted)| zone.measured() - *predicted > settings.margin);

        let mut overridden = 0u8;
        if detected && settings.auto_control {
            for (i, zone) in zones.iter_mut().enumerate() {
                let measured = zone.measured();
                if measured > settings.max_exotherm_temp {
                    zone.set_setpoint(measured - settings.setback);
                    overridden |= 1 << i;
                }
            }
        }

        self.status = ExothermStatus {
            detected,
            overridden,
        };
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: GuardSettings = GuardSettings {
        auto_control: true,
        max_exotherm_temp: 190.0,
        margin: 5.0,
        setback: 5.0,
    };

    fn zones_at(temps: &[f32], setpoint: f32) -> Vec<ZoneLoop, MAX_ZONES> {
        let mut zones = Vec::new();
        for t in temps {
            let mut z = ZoneLoop::new(*t);
            z.set_setpoint(setpoint);
            zones.push(z).unwrap();
        }
        zones
    }

    #[test]
    fn test_prediction_follows_ramp_and_holds() {
        let mut zones = zones_at(&[100.0], 100.0);
        let mut guard = ExothermGuard::new();
        guard.seed(&zones);

        let ramp = Ramp {
            rate: 2.0,
            target: 101.0,
        };
        guard.update(&mut zones, ramp, &SETTINGS, 15.0);
        assert_eq!(guard.predicted()[0], 100.5);
        guard.update(&mut zones, ramp, &SETTINGS, 60.0);
        assert_eq!(guard.predicted()[0], 101.0);
    }

    #[test]
    fn test_tracking_zones_not_flagged() {
        let mut zones = zones_at(&[177.0, 177.5, 176.8, 177.2], 177.0);
        let mut guard = ExothermGuard::new();
        guard.seed(&zones);
        let ramp = Ramp {
            rate: 2.0,
            target: 177.0,
        };
        let status = guard.update(&mut zones, ramp, &SETTINGS, 1.0);
        assert!(!status.detected);
        assert_eq!(status.overridden, 0);
    }

    #[test]
    fn test_override_only_hot_zone() {
        let mut zones = zones_at(&[177.0, 177.0, 177.0, 177.0], 177.0);
        let mut guard = ExothermGuard::new();
        guard.seed(&zones);
        zones[3].record_measurement(200.0);

        let ramp = Ramp {
            rate: 2.0,
            target: 177.0,
        };
        let status = guard.update(&mut zones, ramp, &SETTINGS, 1.0);
        assert!(status.detected);
        assert!(status.is_overridden(3));
        assert_eq!(status.overridden, 0b1000);
        assert_eq!(zones[3].setpoint(), 195.0);
        for zone in &zones[..3] {
            assert_eq!(zone.setpoint(), 177.0);
        }
    }

    #[test]
    fn test_detection_without_auto_control() {
        let mut zones = zones_at(&[177.0, 177.0], 177.0);
        let mut guard = ExothermGuard::new();
        guard.seed(&zones);
        zones[1].record_measurement(200.0);

        let settings = GuardSettings {
            auto_control: false,
            ..SETTINGS
        };
        let ramp = Ramp {
            rate: 2.0,
            target: 177.0,
        };
        let status = guard.update(&mut zones, ramp, &settings, 1.0);
        assert!(status.detected);
        assert_eq!(status.overridden, 0);
        assert_eq!(zones[1].setpoint(), 177.0);
    }

    #[test]
    fn test_hot_but_below_limit_not_overridden() {
        let mut zones = zones_at(&[150.0, 150.0], 150.0);
        let mut guard = ExothermGuard::new();
        guard.seed(&zones);
        zones[0].record_measurement(165.0);
        let ramp = Ramp {
            rate: 2.0,
            target: 150.0,
        };
        let status = guard.update(&mut zones, ramp, &SETTINGS, 1.0);
        assert!(status.detected);
        assert_eq!(status.overridden, 0);
    }
}
