//! Simulated autoclave
//!
//! Each zone is a single thermal mass with Newtonian loss to ambient. The
//! bag is a single volume the pump evacuates and the vent bleeds; the
//! vessel is a single volume the pressure valve fills. Good enough to walk
//! the controller through a full cycle, not to tune it.

use heapless::Vec;

use gelpoint_core::config::{ControllerConfig, FULL_VACUUM_MMHG, MAX_ZONES};
use gelpoint_core::control::MAX_POWER;
use gelpoint_core::traits::{Actuators, SensorError, Sensors};

/// Ambient and initial zone temperature (°C)
pub const AMBIENT_C: f32 = 25.0;

/// Heating rate at full power with no losses (°C/s)
const HEATER_GAIN: f32 = 0.25;

/// Newtonian loss coefficient (1/s)
const THERMAL_LOSS: f32 = 0.0008;

/// Pump evacuation rate at full speed against a vented bag (mmHg/s)
const PUMP_RATE: f32 = 120.0;

/// Fraction of bag vacuum lost per second through an open vent
const VENT_DECAY: f32 = 0.1;

/// Vessel fill rate at full valve opening (psi/s)
const FILL_RATE: f32 = 2.0;

/// Fraction of vessel pressure lost per second through seals
const VESSEL_BLEED: f32 = 0.002;

/// Fraction of vessel pressure lost per second through an open relief
const RELIEF_DECAY: f32 = 0.5;

/// Self-heating decay time constant (s)
const REACTION_DECAY_S: f32 = 300.0;

/// Commands the controller last wrote
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimOutputs {
    pub heaters: [f32; MAX_ZONES],
    pub pump: f32,
    pub valve: f32,
    pub vent: bool,
    pub relief: bool,
}

impl SimOutputs {
    /// Whether every energy source is off and the bag is vented
    pub fn is_safe(&self) -> bool {
        self.heaters.iter().all(|p| *p == 0.0) && self.pump == 0.0 && self.valve == 0.0 && self.vent
    }
}

impl Actuators for SimOutputs {
    fn set_heater_power(&mut self, zone: usize, power: f32) {
        if let Some(heater) = self.heaters.get_mut(zone) {
            *heater = power;
        }
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

#[derive(Debug, Clone)]
pub struct SimPlant {
    temps: Vec<f32, MAX_ZONES>,
    self_heating: Vec<f32, MAX_ZONES>,
    zone_faults: Vec<Option<SensorError>, MAX_ZONES>,
    vacuum_channels: usize,
    pressure_channels: usize,
    vacuum: f32,
    pressure: f32,
    leak: f32,
    vacuum_fault: Option<SensorError>,
    pressure_fault: Option<SensorError>,
    door_closed: bool,
}

impl SimPlant {
    /// Plant at ambient with the channel counts of `config`, door closed
    pub fn new(config: &ControllerConfig) -> Self {
        let zones = config.zone_count.min(MAX_ZONES);
        let mut plant = Self {
            temps: Vec::new(),
            self_heating: Vec::new(),
            zone_faults: Vec::new(),
            vacuum_channels: config.vacuum_channels,
            pressure_channels: config.pressure_channels,
            vacuum: 0.0,
            pressure: 0.0,
            leak: 0.0,
            vacuum_fault: None,
            pressure_fault: None,
            door_closed: true,
        };
        let _ = plant.temps.resize(zones, AMBIENT_C);
        let _ = plant.self_heating.resize(zones, 0.0);
        let _ = plant.zone_faults.resize(zones, None);
        plant
    }

    pub fn temperature(&self, zone: usize) -> Option<f32> {
        self.temps.get(zone).copied()
    }

    pub fn max_temperature(&self) -> f32 {
        self.temps.iter().fold(f32::NEG_INFINITY, |m, t| m.max(*t))
    }

    pub fn vacuum(&self) -> f32 {
        self.vacuum
    }

    pub fn pressure(&self) -> f32 {
        self.pressure
    }

    pub fn set_door_closed(&mut self, closed: bool) {
        self.door_closed = closed;
    }

    /// Bag leak through a torn seal (mmHg/s at full vacuum)
    pub fn set_leak(&mut self, rate: f32) {
        self.leak = rate.max(0.0);
    }

    /// Start a reaction in `zone` releasing `rate` °C/s, decaying as it runs
    pub fn inject_self_heating(&mut self, zone: usize, rate: f32) {
        if let Some(q) = self.self_heating.get_mut(zone) {
            *q = rate;
        }
    }

    /// Make a zone's thermocouple report `fault`, or recover with `None`
    pub fn fail_zone(&mut self, zone: usize, fault: Option<SensorError>) {
        if let Some(slot) = self.zone_faults.get_mut(zone) {
            *slot = fault;
        }
    }

    pub fn fail_vacuum(&mut self, fault: Option<SensorError>) {
        self.vacuum_fault = fault;
    }

    pub fn fail_pressure(&mut self, fault: Option<SensorError>) {
        self.pressure_fault = fault;
    }

    /// Integrate the plant over `dt_s` under the given outputs
    pub fn advance(&mut self, outputs: &SimOutputs, dt_s: f32) {
        for ((temp, q), power) in self
            .temps
            .iter_mut()
            .zip(self.self_heating.iter_mut())
            .zip(outputs.heaters.iter())
        {
            let drive = HEATER_GAIN * power.clamp(0.0, MAX_POWER) / MAX_POWER;
            *temp += (drive - THERMAL_LOSS * (*temp - AMBIENT_C) + *q) * dt_s;
            *q -= *q * (dt_s / REACTION_DECAY_S).min(1.0);
        }

        let headroom = 1.0 - self.vacuum / FULL_VACUUM_MMHG;
        let mut dv = PUMP_RATE * outputs.pump.clamp(0.0, MAX_POWER) / MAX_POWER * headroom;
        dv -= self.leak * self.vacuum / FULL_VACUUM_MMHG;
        if outputs.vent {
            dv -= VENT_DECAY * self.vacuum;
        }
        self.vacuum = (self.vacuum + dv * dt_s).clamp(0.0, FULL_VACUUM_MMHG);

        let mut dp = FILL_RATE * outputs.valve.clamp(0.0, MAX_POWER) / MAX_POWER;
        dp -= VESSEL_BLEED * self.pressure;
        if outputs.relief {
            dp -= RELIEF_DECAY * self.pressure;
        }
        self.pressure = (self.pressure + dp * dt_s).max(0.0);
    }
}

impl Sensors for SimPlant {
    fn read_zone_temperature(&mut self, zone: usize) -> Result<f32, SensorError> {
        match (self.temps.get(zone), self.zone_faults.get(zone)) {
            (Some(_), Some(Some(fault))) => Err(*fault),
            (Some(t), _) => Ok(*t),
            (None, _) => Err(SensorError::NoSuchChannel),
        }
    }

    fn read_vacuum(&mut self, channel: usize) -> Result<f32, SensorError> {
        if channel >= self.vacuum_channels {
            return Err(SensorError::NoSuchChannel);
        }
        match self.vacuum_fault {
            Some(fault) => Err(fault),
            None => Ok(self.vacuum),
        }
    }

    fn read_pressure(&mut self, channel: usize) -> Result<f32, SensorError> {
        if channel >= self.pressure_channels {
            return Err(SensorError::NoSuchChannel);
        }
        match self.pressure_fault {
            Some(fault) => Err(fault),
            None => Ok(self.pressure),
        }
    }

    fn door_closed(&mut self) -> bool {
        self.door_closed
    }
}
