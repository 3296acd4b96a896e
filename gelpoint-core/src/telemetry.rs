//! Telemetry snapshot
//!
//! A read-only copy of everything an operator display or logger needs,
//! taken with [`CureController::snapshot`](crate::CureController::snapshot).
//! With the `serde` feature the snapshot encodes to postcard.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::MAX_ZONES;
use crate::control::{VacuumPressureState, ZoneState};
use crate::exotherm::ExothermStatus;
use crate::kinetics::CureState;
use crate::quality::QualityMetrics;
use crate::safety::AlarmList;
use crate::sequencer::ProcessStatus;

/// Worst-case encoded snapshot size with every alarm slot in use
pub const SNAPSHOT_BUFFER_SIZE: usize = 512;

/// Controller state at one instant
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Snapshot {
    pub zones: Vec<ZoneState, MAX_ZONES>,
    pub vacuum_pressure: VacuumPressureState,
    pub cure: CureState,
    pub quality: QualityMetrics,
    pub status: ProcessStatus,
    pub exotherm: ExothermStatus,
    pub alarms: AlarmList,
}

#[cfg(feature = "serde")]
impl Snapshot {
    /// Encode into `buf`, returning the used prefix
    pub fn encode<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], postcard::Error> {
        postcard::to_slice(self, buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use crate::safety::{AlarmKind, SensorChannel};
    use crate::state::{FaultKind, ProcessState};

    #[test]
    fn test_fault_snapshot_survives_encoding() {
        let mut zones = Vec::new();
        for t in [176.5f32, 177.2, 231.0, 177.0] {
            zones
                .push(ZoneState {
                    measured_temp: t,
                    setpoint: 177.0,
                    power_output: 0.0,
                })
                .unwrap();
        }
        let mut alarms = AlarmList::new();
        alarms.raise(AlarmKind::OverTemperature(2), 4100);
        alarms.raise(AlarmKind::SensorDropout(SensorChannel::Vacuum(0)), 4101);

        let snapshot = Snapshot {
            zones,
            vacuum_pressure: VacuumPressureState::default(),
            cure: *crate::kinetics::KineticsEngine::new(Default::default()).state(),
            quality: QualityMetrics::default(),
            status: ProcessStatus {
                state: ProcessState::Fault(FaultKind::OverTemperature),
                current_segment: 0,
                elapsed_time_s: 4101,
                estimated_remaining_s: 0,
                completion_percent: 30.0,
            },
            exotherm: ExothermStatus::default(),
            alarms,
        };

        let mut buf = [0u8; SNAPSHOT_BUFFER_SIZE];
        let used = snapshot.encode(&mut buf).unwrap().len();
        let decoded = Snapshot::decode(&buf[..used]).unwrap();
        assert_eq!(decoded.status.state, ProcessState::Fault(FaultKind::OverTemperature));
        assert!(decoded.alarms.contains(AlarmKind::OverTemperature(2)));
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_full_snapshot_fits_buffer() {
        let mut zones = Vec::new();
        for _ in 0..MAX_ZONES {
            zones.push(ZoneState::default()).unwrap();
        }
        let mut alarms = AlarmList::new();
        for i in 0..crate::safety::MAX_ALARMS as u8 {
            alarms.raise(AlarmKind::SensorFault(SensorChannel::Zone(i)), u32::MAX);
        }
        let snapshot = Snapshot {
            zones,
            vacuum_pressure: VacuumPressureState::default(),
            cure: *crate::kinetics::KineticsEngine::new(Default::default()).state(),
            quality: QualityMetrics::default(),
            status: ProcessStatus {
                state: ProcessState::CureSoak,
                current_segment: 15,
                elapsed_time_s: u32::MAX,
                estimated_remaining_s: u32::MAX,
                completion_percent: 50.0,
            },
            exotherm: ExothermStatus::default(),
            alarms,
        };
        let mut buf = [0u8; SNAPSHOT_BUFFER_SIZE];
        assert!(snapshot.encode(&mut buf).is_ok());
    }
}
