//! Whole-cycle runs of the controller against the simulated autoclave at
//! the default 10 Hz schedule.

use gelpoint_core::config::{
    ControllerConfig, MaterialProperties, ProcessProfile, Recipe, SafetyLimits, Segment,
};
use gelpoint_core::safety::{AlarmKind, EstopLatch};
use gelpoint_core::state::{Event, ProcessState};
use gelpoint_core::CureController;
use gelpoint_drivers::sim::{SimOutputs, SimPlant};

const TICK_S: f32 = 0.1;
const TICKS_PER_HOUR: u32 = 36_000;

struct Bench<'a> {
    controller: CureController<'a>,
    plant: SimPlant,
    outputs: SimOutputs,
}

impl<'a> Bench<'a> {
    fn new(estop: &'a EstopLatch) -> Self {
        let config = ControllerConfig::default();
        let mut controller = CureController::new(config, SafetyLimits::default(), estop).unwrap();
        controller
            .load_recipe(Recipe {
                profile: ProcessProfile::single(Segment::new(177.0, 120, 2.0, 740.0, 0.0)),
                material: MaterialProperties::default(),
            })
            .unwrap();
        Self {
            controller,
            plant: SimPlant::new(&config),
            outputs: SimOutputs::default(),
        }
    }

    fn step(&mut self) -> Option<Event> {
        let event = self.controller.tick(&mut self.plant, &mut self.outputs);
        self.plant.advance(&self.outputs, TICK_S);
        event
    }

    fn run_until(&mut self, state: ProcessState, max_ticks: u32) {
        for _ in 0..max_ticks {
            self.step();
            if self.controller.state() == state {
                return;
            }
            assert!(
                !self.controller.state().is_fault(),
                "faulted on the way to {:?}: {:?}",
                state,
                self.controller.state()
            );
        }
        panic!(
            "never reached {:?}; stuck in {:?}",
            state,
            self.controller.state()
        );
    }
}

#[test]
fn full_cycle_completes_within_six_hours() {
    let estop = EstopLatch::new();
    let mut bench = Bench::new(&estop);
    bench.controller.start_cycle().unwrap();

    bench.run_until(ProcessState::Complete, 6 * TICKS_PER_HOUR);

    let cure = bench.controller.cure();
    assert!(cure.gelation_reached);
    assert!(cure.degree_of_cure > 0.5);
    assert!(bench.outputs.is_safe());
    assert!(bench.plant.vacuum() < ControllerConfig::default().vent_threshold);
    assert!(bench.plant.max_temperature() < 65.0);
}

#[test]
fn exotherm_in_soak_is_overridden_without_fault() {
    let estop = EstopLatch::new();
    let mut bench = Bench::new(&estop);
    bench.controller.start_cycle().unwrap();
    bench.run_until(ProcessState::CureSoak, 4 * TICKS_PER_HOUR);

    // Let the zones settle on the soak setpoint
    for _ in 0..6_000 {
        bench.step();
    }

    bench.plant.inject_self_heating(2, 0.35);
    let mut overridden = false;
    let mut peak = f32::NEG_INFINITY;
    for _ in 0..20_000 {
        bench.step();
        overridden |= bench.controller.exotherm().is_overridden(2);
        peak = peak.max(bench.plant.max_temperature());
        assert_eq!(bench.controller.state(), ProcessState::CureSoak);
    }

    assert!(overridden, "peak {} never triggered an override", peak);
    assert!(peak < SafetyLimits::default().max_temperature);
    assert!(!bench
        .controller
        .alarms()
        .contains(AlarmKind::OverTemperature(2)));
}

#[test]
fn estop_recover_and_restart() {
    let estop = EstopLatch::new();
    let mut bench = Bench::new(&estop);
    bench.controller.start_cycle().unwrap();
    bench.run_until(ProcessState::Heating, 100);
    for _ in 0..3_000 {
        bench.step();
    }
    assert!(bench.outputs.heaters.iter().any(|p| *p > 0.0));

    estop.assert();
    assert_eq!(bench.step(), Some(Event::EmergencyStop));
    assert_eq!(bench.controller.state(), ProcessState::Emergency);
    assert!(bench.outputs.is_safe());
    assert!(bench.outputs.relief);

    // Still latched: neither reset nor restart is accepted
    assert!(bench.controller.reset_fault().is_err());
    estop.release();
    bench.step();
    assert_eq!(bench.controller.state(), ProcessState::Emergency);

    bench.controller.reset_fault().unwrap();
    assert_eq!(bench.controller.state(), ProcessState::Idle);
    assert!(bench.controller.alarms().is_empty());

    bench.controller.start_cycle().unwrap();
    bench.run_until(ProcessState::Heating, 100);
    for _ in 0..100 {
        bench.step();
    }
    assert!(bench.outputs.heaters.iter().any(|p| *p > 0.0));
}
