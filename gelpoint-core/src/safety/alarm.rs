//! Active alarm list
//!
//! Alarms are deduplicated by kind. Warnings come and go with their
//! condition; faults and the emergency alarm stay until the operator resets.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum simultaneously active alarms
pub const MAX_ALARMS: usize = 16;

/// Sensor channel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SensorChannel {
    Zone(u8),
    Vacuum(u8),
    Pressure(u8),
}

/// Alarm conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AlarmKind {
    /// Hardware emergency stop asserted
    EmergencyStop,
    /// Zone above the hard temperature limit
    OverTemperature(u8),
    /// Door opened during a cycle
    DoorOpen,
    /// Vessel above the hard pressure limit
    OverPressure,
    /// Leak rate above threshold
    VacuumLeak,
    /// Leak persisted past the escalation count
    LeakEscalated,
    /// Channel returned a bad sample; last good value in use
    SensorDropout(SensorChannel),
    /// Channel kept failing past the fault limit
    SensorFault(SensorChannel),
    /// Zone running hotter than the ramp predicts
    Exotherm,
    /// Zone deviation above the warning level
    TemperatureDeviation,
}

/// Alarm severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Severity {
    Warning,
    Fault,
    Emergency,
}

impl AlarmKind {
    pub fn severity(&self) -> Severity {
        match self {
            AlarmKind::EmergencyStop => Severity::Emergency,
            AlarmKind::OverTemperature(_)
            | AlarmKind::DoorOpen
            | AlarmKind::OverPressure
            | AlarmKind::LeakEscalated
            | AlarmKind::SensorFault(_) => Severity::Fault,
            AlarmKind::VacuumLeak
            | AlarmKind::SensorDropout(_)
            | AlarmKind::Exotherm
            | AlarmKind::TemperatureDeviation => Severity::Warning,
        }
    }
}

/// One active alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Alarm {
    pub kind: AlarmKind,
    pub severity: Severity,
    /// Cycle time when first raised (s)
    pub raised_at_s: u32,
}

/// Deduplicated set of active alarms
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlarmList {
    alarms: Vec<Alarm, MAX_ALARMS>,
}

impl AlarmList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alarm> {
        self.alarms.iter()
    }

    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    pub fn contains(&self, kind: AlarmKind) -> bool {
        self.alarms.iter().any(|a| a.kind == kind)
    }

    /// Highest severity present
    pub fn highest(&self) -> Option<Severity> {
        self.alarms.iter().map(|a| a.severity).max()
    }

    /// Raise an alarm; returns `true` if it was not already active
    ///
    /// When the list is full a fault or emergency displaces the oldest
    /// warning; a warning is dropped.
    pub fn raise(&mut self, kind: AlarmKind, now_s: u32) -> bool {
        if self.contains(kind) {
            return false;
        }

        let alarm = Alarm {
            kind,
            severity: kind.severity(),
            raised_at_s: now_s,
        };

        if self.alarms.is_full() {
            if alarm.severity == Severity::Warning {
                return false;
            }
            match self
                .alarms
                .iter()
                .position(|a| a.severity == Severity::Warning)
            {
                Some(pos) => {
                    self.alarms.remove(pos);
                }
                None => return false,
            }
        }

        self.alarms.push(alarm).is_ok()
    }

    /// Raise a condition while active, clear it when inactive
    ///
    /// Only warnings are cleared this way.
    pub fn set(&mut self, kind: AlarmKind, active: bool, now_s: u32) -> bool {
        if active {
            self.raise(kind, now_s)
        } else {
            if kind.severity() == Severity::Warning {
                self.clear(kind);
            }
            false
        }
    }

    pub fn clear(&mut self, kind: AlarmKind) {
        self.alarms.retain(|a| a.kind != kind);
    }

    /// Drop everything; used on operator reset and cycle start
    pub fn clear_all(&mut self) {
        self.alarms.clear();
    }
}
