//! Safety monitor implementation
//!
//! Checks the emergency-stop latch, door interlock, zone temperatures,
//! vessel pressure, bag leak rate and sensor health. Runs first on every
//! base tick; its verdict overrides everything the sequencer and the
//! exotherm guard decide in the same tick.

use crate::config::SafetyLimits;
use crate::state::FaultKind;

/// Inputs sampled for one safety check
#[derive(Debug, Clone, Copy)]
pub struct SafetyInputs<'a> {
    /// E-stop latch state
    pub estop: bool,
    /// Door closed and locked
    pub door_closed: bool,
    /// A cure cycle is in progress
    pub cycle_active: bool,
    /// Last good sample per zone (°C)
    pub zone_temps: &'a [f32],
    /// Highest vessel pressure reading (psi)
    pub pressure: f32,
    /// Smoothed leak rate (mmHg/min)
    pub leak_rate: f32,
    /// Leak rate below threshold
    pub integrity: bool,
    /// Longest current run of bad samples on any channel
    pub worst_sensor_streak: u16,
}

/// Safety condition status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStatus {
    /// All conditions normal
    Ok,
    /// Safety condition violated
    Fault(FaultKind),
    /// Emergency stop asserted
    Emergency,
}

/// Full verdict of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SafetyReport {
    /// Highest-precedence condition
    pub status: SafetyStatus,
    /// Bit `i` set when zone `i` is over temperature
    pub over_temperature: u8,
    /// Vessel above the pressure limit; relief must open
    pub over_pressure: bool,
    /// Leak rate above threshold this tick
    pub leak_alarm: bool,
    /// Some channel is using a stale sample
    pub sensor_dropout: bool,
}

impl SafetyReport {
    pub fn zone_over_temperature(&self, zone: usize) -> bool {
        zone < 8 && self.over_temperature & (1 << zone) != 0
    }
}

/// Safety monitor for fault detection
///
/// Most checks are stateless; the monitor only remembers how long the
/// leak alarm has persisted.
#[derive(Debug, Clone, Default)]
pub struct SafetyMonitor {
    leak_streak: u16,
}

impl SafetyMonitor {
    /// Create a new safety monitor
    pub fn new() -> Self {
        Self::default()
    }

    /// Consecutive control ticks with the leak alarm raised
    pub fn leak_streak(&self) -> u16 {
        self.leak_streak
    }

    /// Forget the leak history; used on reset and cycle start
    pub fn reset(&mut self) {
        self.leak_streak = 0;
    }

    /// Check all safety conditions
    ///
    /// `control_tick` is set on ticks where the leak estimate was refreshed;
    /// only those count toward leak escalation.
    pub fn check(
        &mut self,
        inputs: &SafetyInputs<'_>,
        limits: &SafetyLimits,
        control_tick: bool,
    ) -> SafetyReport {
        let mut over_temperature = 0u8;
        for (i, temp) in inputs.zone_temps.iter().enumerate().take(8) {
            if *temp > limits.max_temperature {
                over_temperature |= 1 << i;
            }
        }

        let over_pressure = inputs.pressure > limits.max_pressure;

        let leak_alarm = !inputs.integrity && inputs.leak_rate > limits.leak_threshold;
        if control_tick {
            self.leak_streak = if leak_alarm {
                self.leak_streak.saturating_add(1)
            } else {
                0
            };
        }

        let sensor_dropout = inputs.worst_sensor_streak > 0;

        let status = if inputs.estop {
            SafetyStatus::Emergency
        } else if over_temperature != 0 {
            SafetyStatus::Fault(FaultKind::OverTemperature)
        } else if inputs.cycle_active && !inputs.door_closed {
            SafetyStatus::Fault(FaultKind::DoorOpen)
        } else if over_pressure {
            SafetyStatus::Fault(FaultKind::OverPressure)
        } else if self.leak_streak >= limits.leak_escalation_count {
            SafetyStatus::Fault(FaultKind::VacuumLeak)
        } else if inputs.worst_sensor_streak >= limits.sensor_fault_limit {
            SafetyStatus::Fault(FaultKind::SensorFault)
        } else {
            SafetyStatus::Ok
        };

        SafetyReport {
            status,
            over_temperature,
            over_pressure,
            leak_alarm,
            sensor_dropout,
        }
    }

    /// Whether the condition behind a fault has cleared
    ///
    /// The door must be closed for any reset, since the next state is
    /// `Idle` with the vessel ready to start.
    pub fn condition_cleared(
        &self,
        kind: FaultKind,
        inputs: &SafetyInputs<'_>,
        limits: &SafetyLimits,
    ) -> bool {
        if !inputs.door_closed {
            return false;
        }
        match kind {
            FaultKind::OverTemperature => inputs
                .zone_temps
                .iter()
                .all(|t| *t <= limits.max_temperature),
            FaultKind::DoorOpen => true,
            FaultKind::OverPressure => inputs.pressure <= limits.max_pressure,
            FaultKind::VacuumLeak => true,
            FaultKind::SensorFault => inputs.worst_sensor_streak == 0,
        }
    }

    /// Readiness gate for starting a cycle
    pub fn ready(&self, inputs: &SafetyInputs<'_>, limits: &SafetyLimits) -> bool {
        !inputs.estop
            && inputs.door_closed
            && inputs.worst_sensor_streak == 0
            && inputs
                .zone_temps
                .iter()
                .all(|t| t.is_finite() && *t <= limits.max_temperature)
            && inputs.pressure.is_finite()
            && inputs.pressure <= limits.max_pressure
    }
}
