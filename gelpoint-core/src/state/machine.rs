//! Process state machine definition
//!
//! Every actuator decision is a function of the current state and the
//! latest sensor snapshot. Transitions happen only through [`ProcessState::transition`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::events::Event;

/// Process states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProcessState {
    /// No cycle running; recipe may be loaded
    #[default]
    Idle,
    /// Ramping to the first segment's target temperature
    Heating,
    /// Pulling bag vacuum to the first segment's target
    VacuumPull,
    /// Ramping to the current segment's target temperature
    CureRamp,
    /// Holding the current segment's target for its duration
    CureSoak,
    /// Ramping down to the cool-down temperature
    CoolDown,
    /// Releasing vacuum and pressure
    Venting,
    /// Cycle finished; waiting for operator acknowledge
    Complete,
    /// Safety fault; outputs forced safe until reset
    Fault(FaultKind),
    /// Hardware emergency stop asserted
    Emergency,
}

/// Conditions that halt a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FaultKind {
    /// A zone exceeded the hard temperature limit
    OverTemperature,
    /// Door opened while a cycle was active
    DoorOpen,
    /// Vessel pressure exceeded the hard limit
    OverPressure,
    /// Vacuum leak persisted past the escalation count
    VacuumLeak,
    /// A sensor channel kept returning bad samples
    SensorFault,
}

impl ProcessState {
    /// Check if a cure cycle is in progress
    pub fn is_cycle_active(&self) -> bool {
        matches!(
            self,
            ProcessState::Heating
                | ProcessState::VacuumPull
                | ProcessState::CureRamp
                | ProcessState::CureSoak
                | ProcessState::CoolDown
                | ProcessState::Venting
        )
    }

    /// Check if this state allows heater operation
    pub fn heaters_allowed(&self) -> bool {
        matches!(
            self,
            ProcessState::Heating
                | ProcessState::VacuumPull
                | ProcessState::CureRamp
                | ProcessState::CureSoak
                | ProcessState::CoolDown
        )
    }

    /// Check if zone setpoints ramp in this state
    pub fn is_ramping(&self) -> bool {
        matches!(
            self,
            ProcessState::Heating | ProcessState::CureRamp | ProcessState::CoolDown
        )
    }

    /// Check if this is a fault or emergency state
    pub fn is_fault(&self) -> bool {
        matches!(self, ProcessState::Fault(_) | ProcessState::Emergency)
    }

    /// Check if the resin is being tracked by the kinetics engine
    pub fn tracks_cure(&self) -> bool {
        !matches!(self, ProcessState::Idle | ProcessState::Complete)
    }

    /// Position on the forward path, used to order states
    pub fn ordinal(&self) -> u8 {
        match self {
            ProcessState::Idle => 0,
            ProcessState::Heating => 1,
            ProcessState::VacuumPull => 2,
            ProcessState::CureRamp => 3,
            ProcessState::CureSoak => 4,
            ProcessState::CoolDown => 5,
            ProcessState::Venting => 6,
            ProcessState::Complete => 7,
            ProcessState::Fault(_) => 8,
            ProcessState::Emergency => 9,
        }
    }

    /// Process an event and return the next state
    ///
    /// Pairs not listed leave the state unchanged.
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use ProcessState::*;

        match (self, event) {
            // Emergency beats everything, including an existing fault
            (_, EmergencyStop) => Emergency,
            (Emergency, ResetFault) => Idle,
            (Emergency, _) => Emergency,

            // First fault wins until reset
            (Fault(_), ResetFault) => Idle,
            (Fault(_), _) => self,
            (_, FaultDetected(kind)) => Fault(kind),

            // Forward path
            (Idle, SubsystemsReady) => Heating,
            (Heating, TemperatureReached) => VacuumPull,
            (VacuumPull, VacuumReached) => CureRamp,
            (CureRamp, TemperatureReached) => CureSoak,
            (CureSoak, SegmentElapsed) => CureRamp,
            (CureSoak, ProfileFinished) => CoolDown,
            (CoolDown, CooledDown) => Venting,
            (Venting, Vented) => Complete,
            (Complete, Acknowledge) => Idle,

            // Operator stop from any running state
            (Heating | VacuumPull | CureRamp | CureSoak | CoolDown | Venting, Stop) => Idle,

            // Default: stay in current state
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [ProcessState; 10] = [
        ProcessState::Idle,
        ProcessState::Heating,
        ProcessState::VacuumPull,
        ProcessState::CureRamp,
        ProcessState::CureSoak,
        ProcessState::CoolDown,
        ProcessState::Venting,
        ProcessState::Complete,
        ProcessState::Fault(FaultKind::DoorOpen),
        ProcessState::Emergency,
    ];

    #[test]
    fn test_canonical_forward_path() {
        let path = [
            (Event::SubsystemsReady, ProcessState::Heating),
            (Event::TemperatureReached, ProcessState::VacuumPull),
            (Event::VacuumReached, ProcessState::CureRamp),
            (Event::TemperatureReached, ProcessState::CureSoak),
            (Event::ProfileFinished, ProcessState::CoolDown),
            (Event::CooledDown, ProcessState::Venting),
            (Event::Vented, ProcessState::Complete),
            (Event::Acknowledge, ProcessState::Idle),
        ];

        let mut state = ProcessState::Idle;
        for (event, expected) in path {
            state = state.transition(event);
            assert_eq!(state, expected);
        }
    }

    #[test]
    fn test_multi_segment_loop() {
        let soak = ProcessState::CureSoak;
        assert_eq!(soak.transition(Event::SegmentElapsed), ProcessState::CureRamp);
    }

    #[test]
    fn test_out_of_order_events_ignored() {
        assert_eq!(
            ProcessState::Idle.transition(Event::VacuumReached),
            ProcessState::Idle
        );
        assert_eq!(
            ProcessState::Heating.transition(Event::Vented),
            ProcessState::Heating
        );
        assert_eq!(
            ProcessState::VacuumPull.transition(Event::TemperatureReached),
            ProcessState::VacuumPull
        );
        assert_eq!(
            ProcessState::Complete.transition(Event::SubsystemsReady),
            ProcessState::Complete
        );
    }

    #[test]
    fn test_emergency_from_any_state() {
        for state in ALL_STATES {
            assert_eq!(
                state.transition(Event::EmergencyStop),
                ProcessState::Emergency
            );
        }
    }

    #[test]
    fn test_fault_from_any_state() {
        for state in ALL_STATES {
            let next = state.transition(Event::FaultDetected(FaultKind::OverTemperature));
            match state {
                ProcessState::Emergency => assert_eq!(next, ProcessState::Emergency),
                ProcessState::Fault(kind) => assert_eq!(next, ProcessState::Fault(kind)),
                _ => assert_eq!(next, ProcessState::Fault(FaultKind::OverTemperature)),
            }
        }
    }

    #[test]
    fn test_fault_exit_only_by_reset() {
        let fault = ProcessState::Fault(FaultKind::OverPressure);
        assert_eq!(fault.transition(Event::Stop), fault);
        assert_eq!(fault.transition(Event::Acknowledge), fault);
        assert_eq!(fault.transition(Event::SubsystemsReady), fault);
        assert_eq!(fault.transition(Event::ResetFault), ProcessState::Idle);

        let emergency = ProcessState::Emergency;
        assert_eq!(emergency.transition(Event::Stop), emergency);
        assert_eq!(emergency.transition(Event::ResetFault), ProcessState::Idle);
    }

    #[test]
    fn test_stop_returns_to_idle() {
        for state in ALL_STATES {
            let next = state.transition(Event::Stop);
            if state.is_cycle_active() {
                assert_eq!(next, ProcessState::Idle);
            } else {
                assert_eq!(next, state);
            }
        }
    }

    #[test]
    fn test_heaters_allowed() {
        assert!(ProcessState::Heating.heaters_allowed());
        assert!(ProcessState::CureSoak.heaters_allowed());
        assert!(ProcessState::CoolDown.heaters_allowed());
        assert!(!ProcessState::Venting.heaters_allowed());
        assert!(!ProcessState::Idle.heaters_allowed());
        assert!(!ProcessState::Fault(FaultKind::DoorOpen).heaters_allowed());
        assert!(!ProcessState::Emergency.heaters_allowed());
    }

    #[test]
    fn test_ordinal_follows_forward_path() {
        for pair in ALL_STATES[..8].windows(2) {
            assert!(pair[0].ordinal() < pair[1].ordinal());
        }
    }
}
