//! Full-cycle scenarios against an ideal plant.
//!
//! The plant tracks every setpoint one tick late: zone temperatures settle
//! just under the zone setpoints, vacuum and pressure move toward their
//! setpoints at a fixed slew. Ticks are one second with every tick a
//! control tick.

use gelpoint_core::config::{
    ControllerConfig, MaterialProperties, ProcessProfile, Recipe, SafetyLimits, Segment,
    TickSchedule,
};
use gelpoint_core::safety::{AlarmKind, EstopLatch};
use gelpoint_core::sequencer::approach;
use gelpoint_core::state::{Event, FaultKind, ProcessState};
use gelpoint_core::traits::{Actuators, SensorError, Sensors};
use gelpoint_core::CureController;

const ZONES: usize = 4;

/// Zones settle this far under their setpoint, so the heaters stay on
const TRACKING_OFFSET: f32 = 0.5;

struct IdealPlant {
    temps: [f32; ZONES],
    vacuum: f32,
    pressure: f32,
    door_closed: bool,
    /// Zone held at a fixed temperature regardless of its setpoint
    pinned: Option<(usize, f32)>,
}

impl IdealPlant {
    fn ambient() -> Self {
        Self {
            temps: [25.0; ZONES],
            vacuum: 0.0,
            pressure: 0.0,
            door_closed: true,
            pinned: None,
        }
    }

    fn follow(&mut self, controller: &CureController<'_>) {
        if controller.state().heaters_allowed() {
            for (t, zone) in self.temps.iter_mut().zip(controller.zones()) {
                *t = zone.setpoint() - TRACKING_OFFSET;
            }
        }
        if let Some((zone, temp)) = self.pinned {
            self.temps[zone] = temp;
        }
        let vp = controller.vacuum_pressure();
        self.vacuum = approach(self.vacuum, vp.vacuum_setpoint, 50.0);
        self.pressure = approach(self.pressure, vp.pressure_setpoint, 5.0);
    }
}

impl Sensors for IdealPlant {
    fn read_zone_temperature(&mut self, zone: usize) -> Result<f32, SensorError> {
        self.temps
            .get(zone)
            .copied()
            .ok_or(SensorError::NoSuchChannel)
    }

    fn read_vacuum(&mut self, _channel: usize) -> Result<f32, SensorError> {
        Ok(self.vacuum)
    }

    fn read_pressure(&mut self, _channel: usize) -> Result<f32, SensorError> {
        Ok(self.pressure)
    }

    fn door_closed(&mut self) -> bool {
        self.door_closed
    }
}

#[derive(Default)]
struct Outputs {
    heaters: [f32; ZONES],
    pump: f32,
    valve: f32,
    vent: bool,
    relief: bool,
}

impl Actuators for Outputs {
    fn set_heater_power(&mut self, zone: usize, power: f32) {
        self.heaters[zone] = power;
    }

    fn set_vacuum_pump(&mut self, power: f32) {
        self.pump = power;
    }

    fn set_pressure_valve(&mut self, power: f32) {
        self.valve = power;
    }

    fn open_vent(&mut self, open: bool) {
        self.vent = open;
    }

    fn open_pressure_relief(&mut self, open: bool) {
        self.relief = open;
    }
}

struct Rig<'a> {
    controller: CureController<'a>,
    plant: IdealPlant,
    out: Outputs,
}

impl<'a> Rig<'a> {
    fn new(estop: &'a EstopLatch) -> Self {
        Self::with_profile(
            estop,
            ProcessProfile::single(Segment::new(177.0, 120, 2.0, 740.0, 0.0)),
        )
    }

    fn with_profile(estop: &'a EstopLatch, profile: ProcessProfile) -> Self {
        let config = ControllerConfig {
            zone_count: ZONES,
            schedule: TickSchedule::one_hz(),
            ..ControllerConfig::default()
        };
        let mut controller = CureController::new(config, SafetyLimits::default(), estop).unwrap();
        controller
            .load_recipe(Recipe {
                profile,
                material: MaterialProperties::default(),
            })
            .unwrap();
        Self {
            controller,
            plant: IdealPlant::ambient(),
            out: Outputs::default(),
        }
    }

    fn started(estop: &'a EstopLatch) -> Self {
        let mut rig = Self::new(estop);
        rig.controller.start_cycle().unwrap();
        rig
    }

    fn step(&mut self) -> Option<Event> {
        let event = self.controller.tick(&mut self.plant, &mut self.out);
        self.plant.follow(&self.controller);
        event
    }

    /// Tick until `state` is entered; returns the ticks taken
    fn run_until(&mut self, state: ProcessState, max_ticks: u32) -> u32 {
        for n in 1..=max_ticks {
            self.step();
            if self.controller.state() == state {
                return n;
            }
        }
        panic!(
            "never reached {:?}; stuck in {:?}",
            state,
            self.controller.state()
        );
    }

    fn avg_temp(&self) -> f32 {
        let zones = self.controller.zones();
        zones.iter().map(|z| z.measured()).sum::<f32>() / zones.len() as f32
    }
}

#[test]
fn single_segment_cycle_follows_canonical_path() {
    let estop = EstopLatch::new();
    let mut rig = Rig::started(&estop);

    let mut path = vec![ProcessState::Idle];
    let mut soak_ticks = 0u32;
    let mut gelations = 0;
    let mut was_gelled = false;

    for _ in 0..20_000 {
        let before = rig.controller.state();
        rig.step();
        let after = rig.controller.state();

        if after == ProcessState::CureSoak {
            soak_ticks += 1;
            let quality = rig.controller.quality();
            assert!(quality.meets_spec, "quality dropped in soak: {:?}", quality);
        }
        if after != before {
            match after {
                ProcessState::VacuumPull => assert!(rig.avg_temp() >= 175.0),
                ProcessState::CureRamp => {
                    assert!(rig.controller.vacuum_pressure().vacuum_measured >= 735.0)
                }
                _ => {}
            }
            path.push(after);
        }

        let gelled = rig.controller.cure().gelation_reached;
        if gelled && !was_gelled {
            gelations += 1;
        }
        assert!(!was_gelled || gelled, "gelation latch reset mid-cycle");
        was_gelled = gelled;

        if after == ProcessState::Complete {
            break;
        }
    }

    assert_eq!(
        path,
        vec![
            ProcessState::Idle,
            ProcessState::Heating,
            ProcessState::VacuumPull,
            ProcessState::CureRamp,
            ProcessState::CureSoak,
            ProcessState::CoolDown,
            ProcessState::Venting,
            ProcessState::Complete,
        ]
    );
    // 120 min soak at one tick per second
    assert!((7199..=7201).contains(&soak_ticks), "soak lasted {}", soak_ticks);
    assert_eq!(gelations, 1);

    let cure = rig.controller.cure();
    assert!(cure.degree_of_cure > 0.9);
    assert!(cure.vitrification_reached);

    let status = rig.controller.status();
    assert_eq!(status.completion_percent, 100.0);
    assert!(rig.out.heaters.iter().all(|p| *p == 0.0));
    assert!(rig.out.vent);

    rig.controller.acknowledge().unwrap();
    assert_eq!(rig.controller.state(), ProcessState::Idle);
}

#[test]
fn two_segment_cycle_advances_through_both_soaks() {
    let mut profile = ProcessProfile::single(Segment::new(121.0, 30, 2.0, 740.0, 0.0));
    profile
        .push_segment(Segment::new(177.0, 60, 1.5, 740.0, 85.0))
        .unwrap();

    let estop = EstopLatch::new();
    let mut rig = Rig::with_profile(&estop, profile);
    rig.controller.start_cycle().unwrap();

    let mut path = vec![(ProcessState::Idle, 0u8)];
    let mut soak_ticks = [0u32; 2];
    for _ in 0..30_000 {
        let before = rig.controller.state();
        rig.step();
        let after = rig.controller.state();
        let segment = rig.controller.status().current_segment;

        if after == ProcessState::CureSoak {
            soak_ticks[segment as usize] += 1;
        }
        if after != before {
            if after == ProcessState::CureSoak {
                let target = if segment == 0 { 121.0 } else { 177.0 };
                assert!((rig.avg_temp() - target).abs() <= 2.0);
            }
            path.push((after, segment));
        }
        if after == ProcessState::Complete {
            break;
        }
    }

    let states: Vec<_> = path
        .iter()
        .filter(|(s, _)| matches!(s, ProcessState::CureRamp | ProcessState::CureSoak))
        .copied()
        .collect();
    assert_eq!(
        states,
        vec![
            (ProcessState::CureRamp, 0),
            (ProcessState::CureSoak, 0),
            (ProcessState::CureRamp, 1),
            (ProcessState::CureSoak, 1),
        ]
    );
    assert_eq!(path.last().map(|(s, _)| *s), Some(ProcessState::Complete));
    assert!((1799..=1801).contains(&soak_ticks[0]), "first soak {}", soak_ticks[0]);
    assert!((3599..=3601).contains(&soak_ticks[1]), "second soak {}", soak_ticks[1]);
    assert!(!rig.controller.state().is_fault());
}

#[test]
fn estop_from_any_state_is_safe_within_one_tick() {
    let targets = [
        ProcessState::Idle,
        ProcessState::Heating,
        ProcessState::VacuumPull,
        ProcessState::CureRamp,
        ProcessState::CureSoak,
        ProcessState::CoolDown,
        ProcessState::Venting,
        ProcessState::Complete,
    ];

    for target in targets {
        let estop = EstopLatch::new();
        let mut rig = Rig::new(&estop);
        if target != ProcessState::Idle {
            rig.controller.start_cycle().unwrap();
            rig.run_until(target, 20_000);
        }

        estop.assert();
        assert_eq!(rig.step(), Some(Event::EmergencyStop), "from {:?}", target);
        assert_eq!(rig.controller.state(), ProcessState::Emergency);
        assert!(rig.out.heaters.iter().all(|p| *p == 0.0), "from {:?}", target);
        assert_eq!(rig.out.pump, 0.0);
        assert_eq!(rig.out.valve, 0.0);
        assert!(rig.out.vent && rig.out.relief);
        assert!(rig.controller.alarms().contains(AlarmKind::EmergencyStop));
    }
}

#[test]
fn door_open_in_soak_faults_next_tick() {
    let estop = EstopLatch::new();
    let mut rig = Rig::started(&estop);
    rig.run_until(ProcessState::CureSoak, 10_000);
    for _ in 0..60 {
        rig.step();
    }
    assert!(rig.out.heaters.iter().any(|p| *p > 0.0));

    rig.plant.door_closed = false;
    assert_eq!(
        rig.step(),
        Some(Event::FaultDetected(FaultKind::DoorOpen))
    );
    assert_eq!(rig.controller.state(), ProcessState::Fault(FaultKind::DoorOpen));
    assert!(rig.out.heaters.iter().all(|p| *p == 0.0));

    // State and alarms stay readable mid-fault
    let snapshot = rig.controller.snapshot();
    assert_eq!(snapshot.status.state, ProcessState::Fault(FaultKind::DoorOpen));
    assert!(snapshot.alarms.contains(AlarmKind::DoorOpen));
}

#[test]
fn exotherm_overrides_only_the_hot_zone() {
    let estop = EstopLatch::new();
    let mut rig = Rig::started(&estop);
    rig.run_until(ProcessState::CureSoak, 10_000);

    let max_exotherm = rig.controller.profile().unwrap().max_exotherm_temp;
    rig.plant.pinned = Some((3, max_exotherm + 10.0));
    rig.plant.temps[3] = max_exotherm + 10.0;
    rig.step();

    let zones = rig.controller.zones();
    assert_eq!(zones[3].setpoint(), max_exotherm + 10.0 - 5.0);
    for zone in &zones[..3] {
        assert_eq!(zone.setpoint(), 177.0);
    }
    assert!(rig.controller.exotherm().detected);
    assert!(rig.controller.exotherm().is_overridden(3));
    assert!(rig.controller.alarms().contains(AlarmKind::Exotherm));
    assert_eq!(rig.controller.state(), ProcessState::CureSoak);
}

#[test]
fn leak_escalates_to_fault() {
    let estop = EstopLatch::new();
    let mut rig = Rig::started(&estop);
    rig.run_until(ProcessState::CureSoak, 10_000);

    let mut leaked = false;
    for _ in 0..120 {
        // Bag loses 80 mmHg between ticks; the pump only recovers 50
        rig.plant.vacuum -= 80.0;
        rig.step();
        if rig.controller.alarms().contains(AlarmKind::VacuumLeak) {
            leaked = true;
        }
        if rig.controller.state().is_fault() {
            break;
        }
    }

    assert!(leaked);
    assert_eq!(rig.controller.state(), ProcessState::Fault(FaultKind::VacuumLeak));
    assert!(rig.controller.alarms().contains(AlarmKind::LeakEscalated));
}
