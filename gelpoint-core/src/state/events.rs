//! Events that trigger state transitions

use super::machine::FaultKind;

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Readiness
    /// Start requested and every subsystem reports ready
    SubsystemsReady,

    // Sequencer events
    /// Average temperature converged on the active ramp target
    TemperatureReached,
    /// Average vacuum converged on the segment target
    VacuumReached,
    /// Soak finished and another segment follows
    SegmentElapsed,
    /// Soak of the last segment finished
    ProfileFinished,
    /// Average temperature reached the cool-down target
    CooledDown,
    /// Vacuum released below the vent threshold
    Vented,

    // Safety events
    /// Safety monitor detected a fault condition
    FaultDetected(FaultKind),
    /// Hardware emergency-stop line asserted
    EmergencyStop,

    // Operator commands
    /// Abort the running cycle
    Stop,
    /// Clear a fault or released emergency stop
    ResetFault,
    /// Acknowledge a completed cycle
    Acknowledge,
}
