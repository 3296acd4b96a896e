//! Cure controller tick loop
//!
//! The controller is the central brain that:
//! - Samples the sensors and checks safety every base tick
//! - Runs the sequencer, control loops and exotherm guard every control tick
//! - Integrates cure kinetics and recomputes quality
//! - Keeps the alarm list and the telemetry snapshot
//!
//! Everything runs on the caller's tick; nothing here blocks or allocates.

mod command;
mod readings;

pub use command::CommandError;
pub use readings::Readings;

use heapless::Vec;

use crate::config::{
    ConfigError, ControllerConfig, MaterialProperties, ProcessProfile, SafetyLimits, MAX_ZONES,
};
use crate::control::{average_temperature, VacuumPressureLoop, VacuumPressureState, ZoneLoop};
use crate::exotherm::{ExothermGuard, ExothermStatus, GuardSettings};
use crate::kinetics::{CureState, KineticsEngine};
use crate::quality::{assess, QualityMetrics};
use crate::safety::{
    AlarmKind, AlarmList, EstopLatch, SafetyInputs, SafetyMonitor, SafetyReport, SafetyStatus,
    Severity,
};
use crate::sequencer::{ProcessStatus, Sequencer, SequencerInputs};
use crate::state::{Event, FaultKind, ProcessState};
use crate::telemetry::Snapshot;
use crate::traits::{Actuators, Sensors};

/// Controller state for coordinating subsystems
pub struct CureController<'a> {
    config: ControllerConfig,
    limits: SafetyLimits,
    /// Set from interrupt context, sampled first every tick
    estop: &'a EstopLatch,
    /// Current process state
    state: ProcessState,
    sequencer: Sequencer,
    recipe_loaded: bool,
    /// Start accepted, waiting for the readiness gate
    start_requested: bool,
    zones: Vec<ZoneLoop, MAX_ZONES>,
    vacuum: VacuumPressureLoop,
    readings: Readings,
    kinetics: KineticsEngine,
    guard: ExothermGuard,
    safety: SafetyMonitor,
    alarms: AlarmList,
    quality: QualityMetrics,
    /// Base ticks since power-up
    tick_count: u32,
}

impl<'a> CureController<'a> {
    /// Create a controller with validated configuration
    ///
    /// No recipe is loaded; [`CureController::load_recipe`] must succeed
    /// before a cycle can start.
    pub fn new(
        config: ControllerConfig,
        limits: SafetyLimits,
        estop: &'a EstopLatch,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        limits.validate()?;

        let mut zones = Vec::new();
        for _ in 0..config.zone_count {
            zones
                .push(ZoneLoop::new(f32::NAN))
                .map_err(|_| ConfigError::ZoneCount)?;
        }

        Ok(Self {
            sequencer: Sequencer::new(ProcessProfile::default(), &config),
            readings: Readings::new(&config),
            config,
            limits,
            estop,
            state: ProcessState::Idle,
            recipe_loaded: false,
            start_requested: false,
            zones,
            vacuum: VacuumPressureLoop::new(),
            kinetics: KineticsEngine::new(MaterialProperties::default()),
            guard: ExothermGuard::new(),
            safety: SafetyMonitor::new(),
            alarms: AlarmList::new(),
            quality: QualityMetrics::default(),
            tick_count: 0,
        })
    }

    /// Get current state
    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    /// Loaded profile, if any
    pub fn profile(&self) -> Option<&ProcessProfile> {
        self.recipe_loaded.then(|| self.sequencer.profile())
    }

    /// A start was accepted and is waiting for the readiness gate
    pub fn start_pending(&self) -> bool {
        self.start_requested
    }

    pub fn zones(&self) -> &[ZoneLoop] {
        &self.zones
    }

    pub fn vacuum_pressure(&self) -> &VacuumPressureState {
        self.vacuum.state()
    }

    pub fn cure(&self) -> &CureState {
        self.kinetics.state()
    }

    pub fn quality(&self) -> &QualityMetrics {
        &self.quality
    }

    pub fn exotherm(&self) -> ExothermStatus {
        self.guard.status()
    }

    pub fn alarms(&self) -> &AlarmList {
        &self.alarms
    }

    /// Operator-facing progress
    pub fn status(&self) -> ProcessStatus {
        self.sequencer
            .status(self.state, average_temperature(&self.zones))
    }

    /// Read-only view for telemetry consumers
    pub fn snapshot(&self) -> Snapshot {
        let mut zones = Vec::new();
        for zone in &self.zones {
            // Same capacity as the zone list
            let _ = zones.push(*zone.state());
        }
        Snapshot {
            zones,
            vacuum_pressure: *self.vacuum.state(),
            cure: *self.kinetics.state(),
            quality: self.quality,
            status: self.status(),
            exotherm: self.guard.status(),
            alarms: self.alarms.clone(),
        }
    }

    /// Run one base tick
    ///
    /// Returns the event that changed the state this tick, if any.
    pub fn tick<S: Sensors, A: Actuators>(
        &mut self,
        sensors: &mut S,
        actuators: &mut A,
    ) -> Option<Event> {
        let mut event = None;

        let estop = self.estop.is_asserted();
        if estop {
            self.hold_safe(actuators, true);
            self.start_requested = false;
            let now = self.now_s();
            raise(&mut self.alarms, AlarmKind::EmergencyStop, true, now);
            event = self.apply(Event::EmergencyStop);
        }

        self.tick_count = self.tick_count.wrapping_add(1);
        let control_tick = self.tick_count % self.config.schedule.control_every == 0;

        self.readings.refresh(sensors, &mut self.zones);
        self.vacuum.record_measurement(
            self.readings.vacuum_average(),
            self.readings.pressure_average(),
        );

        let report = self.check_safety(estop, control_tick);

        for (i, zone) in self.zones.iter_mut().enumerate() {
            if report.zone_over_temperature(i) {
                zone.disable();
                actuators.set_heater_power(i, 0.0);
            }
        }
        if report.over_pressure {
            actuators.open_pressure_relief(true);
        }
        self.note_safety_alarms(&report);

        if let SafetyStatus::Fault(kind) = report.status {
            if let Some(e) = self.apply(Event::FaultDetected(kind)) {
                event = Some(e);
            }
        }

        match self.state {
            ProcessState::Emergency => {
                self.hold_safe(actuators, true);
                if control_tick {
                    self.observe();
                }
                return event;
            }
            ProcessState::Fault(kind) => {
                let relief = kind == FaultKind::OverPressure || report.over_pressure;
                self.hold_safe(actuators, relief);
                if control_tick {
                    self.observe();
                }
                return event;
            }
            _ => {}
        }

        if control_tick {
            if let Some(e) = self.control(actuators) {
                event = Some(e);
            }
        }

        event
    }

    /// Control group: sequencer, loops, guard, kinetics, quality
    fn control<A: Actuators>(&mut self, actuators: &mut A) -> Option<Event> {
        let dt_ms = self.config.schedule.control_period_ms();
        let dt_s = self.config.schedule.control_period_s();
        let mut event = None;

        if self.state == ProcessState::Idle && self.start_requested && self.ready() {
            self.begin_cycle();
            event = self.apply(Event::SubsystemsReady);
        }

        let inputs = SequencerInputs {
            avg_temp: average_temperature(&self.zones),
            avg_vacuum: self.vacuum.state().vacuum_measured,
        };
        if let Some(next) = self.sequencer.advance(self.state, &inputs, dt_ms) {
            if let Some(e) = self.apply(next) {
                event = Some(e);
            }
        }

        let cmd = self.sequencer.command(self.state);
        let now = self.now_s();

        if cmd.heaters_enabled {
            for zone in self.zones.iter_mut() {
                zone.set_setpoint(cmd.zone_setpoint);
            }
            let profile = self.sequencer.profile();
            let settings = GuardSettings {
                auto_control: profile.auto_exotherm_control,
                max_exotherm_temp: profile.max_exotherm_temp,
                margin: self.config.exotherm_margin,
                setback: self.config.exotherm_setback,
            };
            let exotherm = self.guard.update(&mut self.zones, cmd.ramp, &settings, dt_s);
            raise(&mut self.alarms, AlarmKind::Exotherm, exotherm.detected, now);

            #[cfg(feature = "defmt")]
            if exotherm.overridden != 0 {
                defmt::warn!("Exotherm override on zones {=u8:b}", exotherm.overridden);
            }
        } else {
            raise(&mut self.alarms, AlarmKind::Exotherm, false, now);
        }

        for (i, zone) in self.zones.iter_mut().enumerate() {
            let power = if cmd.heaters_enabled {
                zone.update(&self.config.zone_gains, self.limits.max_temperature, dt_s)
            } else {
                zone.disable();
                0.0
            };
            actuators.set_heater_power(i, power);
        }

        self.vacuum
            .set_setpoints(cmd.vacuum_setpoint, cmd.pressure_setpoint);
        let (pump, valve) = self.vacuum.update(
            &self.config.vacuum_gains,
            &self.config.pressure_gains,
            self.limits.leak_threshold,
            self.config.leak_smoothing,
            dt_s,
        );
        actuators.set_vacuum_pump(pump);
        actuators.set_pressure_valve(valve);
        actuators.open_vent(cmd.vent_open);
        actuators.open_pressure_relief(false);

        self.observe();

        let deviating = self.state.heaters_allowed()
            && self.quality.temperature_deviation > self.config.deviation_warning;
        raise(&mut self.alarms, AlarmKind::TemperatureDeviation, deviating, now);

        event
    }

    /// Integrate cure kinetics and recompute quality
    ///
    /// Runs in fault states too: the resin keeps curing while the
    /// outputs are held safe.
    fn observe(&mut self) {
        if self.state.tracks_cure() {
            let dt_s = self.config.schedule.control_period_s() as f64;
            let milestones =
                self.kinetics
                    .step(average_temperature(&self.zones), dt_s, self.sequencer.elapsed_s());

            #[cfg(feature = "defmt")]
            {
                let cure = self.kinetics.state();
                if milestones.gelation {
                    defmt::info!("Gelation at {}s, alpha {}", cure.gel_time_s, cure.degree_of_cure);
                }
                if milestones.vitrification {
                    defmt::info!("Vitrification at {}s", cure.vitrification_time_s);
                }
            }
            #[cfg(not(feature = "defmt"))]
            let _ = milestones;
        }
        self.quality = assess(&self.zones, self.vacuum.state());
    }

    fn check_safety(&mut self, estop: bool, control_tick: bool) -> SafetyReport {
        let temps = self.zone_temps();
        let inputs = self.safety_inputs(estop, &temps);
        self.safety.check(&inputs, &self.limits, control_tick)
    }

    fn zone_temps(&self) -> Vec<f32, MAX_ZONES> {
        self.zones.iter().map(|z| z.measured()).collect()
    }

    fn safety_inputs<'t>(&self, estop: bool, zone_temps: &'t [f32]) -> SafetyInputs<'t> {
        let vacuum = self.vacuum.state();
        SafetyInputs {
            estop,
            door_closed: self.readings.door_closed(),
            cycle_active: self.state.is_cycle_active(),
            zone_temps,
            pressure: self.readings.pressure_max(),
            leak_rate: vacuum.leak_rate,
            integrity: vacuum.integrity,
            worst_sensor_streak: self.readings.worst_streak(),
        }
    }

    /// Readiness gate for `Idle → Heating`
    fn ready(&self) -> bool {
        let temps = self.zone_temps();
        let inputs = self.safety_inputs(self.estop.is_asserted(), &temps);
        self.safety.ready(&inputs, &self.limits)
            && self.alarms.highest() < Some(Severity::Fault)
    }

    /// Turn the safety verdict into alarm list entries
    fn note_safety_alarms(&mut self, report: &SafetyReport) {
        let now = self.now_s();
        let alarms = &mut self.alarms;

        for i in 0..self.zones.len() {
            if report.zone_over_temperature(i) {
                raise(alarms, AlarmKind::OverTemperature(i as u8), true, now);
            }
        }

        let door_breach = self.state.is_cycle_active() && !self.readings.door_closed();
        raise(alarms, AlarmKind::DoorOpen, door_breach, now);
        raise(alarms, AlarmKind::OverPressure, report.over_pressure, now);
        raise(alarms, AlarmKind::VacuumLeak, report.leak_alarm, now);
        raise(
            alarms,
            AlarmKind::LeakEscalated,
            report.status == SafetyStatus::Fault(FaultKind::VacuumLeak),
            now,
        );

        for (channel, streak) in self.readings.streaks() {
            raise(alarms, AlarmKind::SensorDropout(channel), streak > 0, now);
            raise(
                alarms,
                AlarmKind::SensorFault(channel),
                streak >= self.limits.sensor_fault_limit,
                now,
            );
        }
    }

    /// Fresh start: α back to zero, leak history and alarms cleared
    fn begin_cycle(&mut self) {
        self.start_requested = false;
        self.kinetics.reset();
        self.safety.reset();
        self.alarms.clear_all();
        self.vacuum.disable();
        self.guard.seed(&self.zones);
    }

    /// Force every output to its safe value
    fn hold_safe<A: Actuators>(&mut self, actuators: &mut A, relief_open: bool) {
        for (i, zone) in self.zones.iter_mut().enumerate() {
            zone.disable();
            actuators.set_heater_power(i, 0.0);
        }
        self.vacuum.disable();
        actuators.set_vacuum_pump(0.0);
        actuators.set_pressure_valve(0.0);
        actuators.open_vent(true);
        actuators.open_pressure_relief(relief_open);
    }

    /// Apply an event; returns it if the state changed
    fn apply(&mut self, event: Event) -> Option<Event> {
        let from = self.state;
        let to = from.transition(event);
        if to == from {
            return None;
        }

        self.state = to;
        self.sequencer
            .enter(from, to, average_temperature(&self.zones));
        if to.is_ramping() {
            self.guard.seed(&self.zones);
        }

        #[cfg(feature = "defmt")]
        defmt::info!("State: {} -> {} ({})", from, to, event);

        Some(event)
    }

    /// Cycle time used to stamp alarms (s)
    fn now_s(&self) -> u32 {
        self.sequencer.elapsed_s()
    }
}

/// Raise or clear an alarm, logging new ones
fn raise(alarms: &mut AlarmList, kind: AlarmKind, active: bool, now_s: u32) {
    let raised = alarms.set(kind, active, now_s);

    #[cfg(feature = "defmt")]
    if raised {
        defmt::warn!("Alarm: {}", kind);
    }
    #[cfg(not(feature = "defmt"))]
    let _ = raised;
}
