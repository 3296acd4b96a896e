//! Recipe sequencer
//!
//! Walks the profile one segment at a time, producing zone, vacuum and
//! pressure setpoints for the current state and the events that move the
//! state machine forward. Runs once per control tick and never blocks.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ramp::{ramp_duration_s, Ramp};
use crate::config::{ControllerConfig, ProcessProfile, Segment};
use crate::state::{Event, ProcessState};

/// Sensor averages the sequencer decides on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencerInputs {
    /// Average zone temperature (°C)
    pub avg_temp: f32,
    /// Average bag vacuum (mmHg)
    pub avg_vacuum: f32,
}

/// Setpoints and output permissions for the current state
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProcessCommand {
    /// Setpoint for every zone before exotherm overrides (°C)
    pub zone_setpoint: f32,
    /// Bag vacuum setpoint (mmHg); zero turns the pump off
    pub vacuum_setpoint: f32,
    /// Vessel pressure setpoint (psi); zero closes the valve
    pub pressure_setpoint: f32,
    /// Bag vent valve open
    pub vent_open: bool,
    /// Zone heaters may run
    pub heaters_enabled: bool,
    /// Ramp the exotherm prediction follows
    pub ramp: Ramp,
}

impl ProcessCommand {
    /// Everything off, vent open
    pub fn safe(hold_temp: f32) -> Self {
        Self {
            zone_setpoint: hold_temp,
            vacuum_setpoint: 0.0,
            pressure_setpoint: 0.0,
            vent_open: true,
            heaters_enabled: false,
            ramp: Ramp {
                rate: 0.0,
                target: hold_temp,
            },
        }
    }
}

/// Operator-facing progress
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProcessStatus {
    pub state: ProcessState,
    /// Active segment index
    pub current_segment: u8,
    /// Time since the cycle started (s)
    pub elapsed_time_s: u32,
    /// Estimated time to the end of cool-down (s)
    pub estimated_remaining_s: u32,
    /// 0..=100
    pub completion_percent: f32,
}

/// Convergence and cool-down settings taken from the controller config
#[derive(Debug, Clone, Copy, PartialEq)]
struct Settings {
    temperature_tolerance: f32,
    vacuum_tolerance: f32,
    vent_threshold: f32,
    cool_down_temp: f32,
    cool_down_rate: f32,
}

impl From<&ControllerConfig> for Settings {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            temperature_tolerance: config.temperature_tolerance,
            vacuum_tolerance: config.vacuum_tolerance,
            vent_threshold: config.vent_threshold,
            cool_down_temp: config.cool_down_temp,
            cool_down_rate: config.cool_down_rate,
        }
    }
}

/// Recipe sequencer
///
/// Owns the profile for the duration of a cycle. The segment index only
/// moves forward, and only on entry to `CureRamp` from `CureSoak`.
#[derive(Debug, Clone)]
pub struct Sequencer {
    profile: ProcessProfile,
    settings: Settings,
    segment_index: usize,
    /// Ramped zone setpoint (°C)
    ramp_setpoint: f32,
    /// Time in the current soak (ms)
    soak_elapsed_ms: u64,
    /// Time since cycle start (ms)
    elapsed_ms: u64,
}

impl Sequencer {
    pub fn new(profile: ProcessProfile, config: &ControllerConfig) -> Self {
        Self {
            profile,
            settings: Settings::from(config),
            segment_index: 0,
            ramp_setpoint: 0.0,
            soak_elapsed_ms: 0,
            elapsed_ms: 0,
        }
    }

    pub fn profile(&self) -> &ProcessProfile {
        &self.profile
    }

    /// Replace the profile; only valid between cycles
    pub fn set_profile(&mut self, profile: ProcessProfile) {
        self.profile = profile;
        self.segment_index = 0;
    }

    pub fn segment_index(&self) -> usize {
        self.segment_index
    }

    /// Current ramped zone setpoint (°C)
    pub fn ramp_setpoint(&self) -> f32 {
        self.ramp_setpoint
    }

    /// Time since cycle start (s)
    pub fn elapsed_s(&self) -> u32 {
        (self.elapsed_ms / 1000).min(u32::MAX as u64) as u32
    }

    /// Time in the current soak (s)
    pub fn soak_elapsed_s(&self) -> u32 {
        (self.soak_elapsed_ms / 1000).min(u32::MAX as u64) as u32
    }

    fn segment(&self) -> Option<&Segment> {
        self.profile.segment(self.segment_index)
    }

    fn last_segment(&self) -> Option<&Segment> {
        self.profile.segments.last()
    }

    /// Entry actions for a state change
    ///
    /// Called by the controller after every transition that changed state.
    pub fn enter(&mut self, from: ProcessState, to: ProcessState, avg_temp: f32) {
        match (from, to) {
            (ProcessState::Idle, ProcessState::Heating) => {
                self.segment_index = 0;
                self.soak_elapsed_ms = 0;
                self.elapsed_ms = 0;
                self.ramp_setpoint = avg_temp;
            }
            (ProcessState::CureSoak, ProcessState::CureRamp) => {
                if self.segment_index + 1 < self.profile.len() {
                    self.segment_index += 1;
                }
            }
            (_, ProcessState::CureSoak) => {
                self.soak_elapsed_ms = 0;
            }
            (_, ProcessState::Idle) => {
                self.segment_index = 0;
                self.soak_elapsed_ms = 0;
                self.elapsed_ms = 0;
            }
            _ => {}
        }
    }

    /// Run the state check for one control tick
    ///
    /// Updates the ramped setpoint and timers, then returns the event that
    /// should advance the state machine, if any.
    pub fn advance(
        &mut self,
        state: ProcessState,
        inputs: &SequencerInputs,
        dt_ms: u32,
    ) -> Option<Event> {
        let dt_s = dt_ms as f32 / 1000.0;

        if state.is_cycle_active() {
            self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms as u64);
        }

        let ramp = self.active_ramp(state)?;
        if state.heaters_allowed() {
            self.ramp_setpoint = ramp.step(self.ramp_setpoint, dt_s);
        }

        let s = &self.settings;
        let temp_converged = within(inputs.avg_temp, ramp.target, s.temperature_tolerance);
        let ramp_done = self.ramp_setpoint == ramp.target;

        match state {
            ProcessState::Heating if temp_converged => Some(Event::TemperatureReached),
            ProcessState::VacuumPull => {
                let target = self.segment()?.vacuum_target;
                if inputs.avg_vacuum >= target - s.vacuum_tolerance {
                    Some(Event::VacuumReached)
                } else {
                    None
                }
            }
            ProcessState::CureRamp if ramp_done && temp_converged => {
                Some(Event::TemperatureReached)
            }
            ProcessState::CureSoak => {
                self.soak_elapsed_ms = self.soak_elapsed_ms.saturating_add(dt_ms as u64);
                let duration_ms = self.segment()?.duration_s as u64 * 1000;
                if self.soak_elapsed_ms < duration_ms {
                    None
                } else if self.segment_index + 1 < self.profile.len() {
                    Some(Event::SegmentElapsed)
                } else {
                    Some(Event::ProfileFinished)
                }
            }
            ProcessState::CoolDown if ramp_done && temp_converged => Some(Event::CooledDown),
            ProcessState::Venting if inputs.avg_vacuum < s.vent_threshold => Some(Event::Vented),
            _ => None,
        }
    }

    /// Ramp the zone setpoint follows in `state`
    fn active_ramp(&self, state: ProcessState) -> Option<Ramp> {
        match state {
            ProcessState::Heating
            | ProcessState::VacuumPull
            | ProcessState::CureRamp
            | ProcessState::CureSoak => {
                let segment = self.segment()?;
                Some(Ramp {
                    rate: segment.heating_rate,
                    target: segment.target_temp,
                })
            }
            ProcessState::CoolDown | ProcessState::Venting => Some(Ramp {
                rate: self.settings.cool_down_rate,
                target: self.settings.cool_down_temp,
            }),
            _ => None,
        }
    }

    /// Setpoints for `state`
    pub fn command(&self, state: ProcessState) -> ProcessCommand {
        let hold = self.ramp_setpoint;
        let ramp = match self.active_ramp(state) {
            Some(ramp) => ramp,
            None => return ProcessCommand::safe(hold),
        };

        let (vacuum, pressure) = match state {
            ProcessState::Heating => (0.0, 0.0),
            ProcessState::VacuumPull => match self.segment() {
                Some(seg) => (seg.vacuum_target, 0.0),
                None => (0.0, 0.0),
            },
            ProcessState::CureRamp | ProcessState::CureSoak => match self.segment() {
                Some(seg) => (seg.vacuum_target, seg.pressure_target),
                None => (0.0, 0.0),
            },
            ProcessState::CoolDown => match self.last_segment() {
                Some(seg) => (seg.vacuum_target, seg.pressure_target),
                None => (0.0, 0.0),
            },
            _ => (0.0, 0.0),
        };

        ProcessCommand {
            zone_setpoint: hold,
            vacuum_setpoint: vacuum,
            pressure_setpoint: pressure,
            vent_open: state == ProcessState::Venting,
            heaters_enabled: state.heaters_allowed(),
            ramp,
        }
    }

    /// Estimated seconds until the end of cool-down
    pub fn estimate_remaining_s(&self, state: ProcessState, avg_temp: f32) -> f32 {
        let cool = |from: f32| {
            ramp_duration_s(
                from,
                self.settings.cool_down_temp,
                self.settings.cool_down_rate,
            )
        };

        // Ramp and soak of every segment after `index`, then cool-down
        let rest = |index: usize| {
            let mut total = 0.0f32;
            let mut from = match self.profile.segment(index) {
                Some(seg) => seg.target_temp,
                None => return 0.0,
            };
            for seg in self.profile.segments.iter().skip(index + 1) {
                total += ramp_duration_s(from, seg.target_temp, seg.heating_rate);
                total += seg.duration_s as f32;
                from = seg.target_temp;
            }
            total + cool(from)
        };

        let current = |from: f32| match self.segment() {
            Some(seg) => {
                ramp_duration_s(from, seg.target_temp, seg.heating_rate)
                    + seg.duration_s as f32
                    + rest(self.segment_index)
            }
            None => 0.0,
        };

        match state {
            ProcessState::Idle => match self.profile.segment(0) {
                Some(seg) => {
                    ramp_duration_s(avg_temp, seg.target_temp, seg.heating_rate)
                        + seg.duration_s as f32
                        + rest(0)
                }
                None => 0.0,
            },
            ProcessState::Heating | ProcessState::VacuumPull | ProcessState::CureRamp => {
                current(self.ramp_setpoint)
            }
            ProcessState::CureSoak => match self.segment() {
                Some(seg) => {
                    let left = seg.duration_s.saturating_sub(self.soak_elapsed_s());
                    left as f32 + rest(self.segment_index)
                }
                None => 0.0,
            },
            ProcessState::CoolDown => cool(self.ramp_setpoint),
            _ => 0.0,
        }
    }

    /// Progress snapshot for `state`
    pub fn status(&self, state: ProcessState, avg_temp: f32) -> ProcessStatus {
        let elapsed = self.elapsed_s();
        let remaining = self.estimate_remaining_s(state, avg_temp);
        let remaining = if remaining.is_finite() && remaining > 0.0 {
            remaining as u32
        } else {
            0
        };

        let completion_percent = match state {
            ProcessState::Complete => 100.0,
            ProcessState::Idle => 0.0,
            _ => {
                let total = elapsed as f32 + remaining as f32;
                if total > 0.0 {
                    (elapsed as f32 / total * 100.0).clamp(0.0, 100.0)
                } else {
                    0.0
                }
            }
        };

        ProcessStatus {
            state,
            current_segment: self.segment_index as u8,
            elapsed_time_s: elapsed,
            estimated_remaining_s: remaining,
            completion_percent,
        }
    }
}

/// `|value − target| <= tolerance`; false for NaN
fn within(value: f32, target: f32, tolerance: f32) -> bool {
    let diff = value - target;
    diff <= tolerance && diff >= -tolerance
}
