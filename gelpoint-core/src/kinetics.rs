//! Cure kinetics engine
//!
//! Integrates the degree of cure with a Kamal–Sourour autocatalytic rate law
//! and derives viscosity and glass-transition temperature from it. Everything
//! here runs in `f64`: at room temperature the Arrhenius rate constant is
//! small enough that single-precision increments vanish.
//!
//! Model:
//! - `k = A · exp(−Ea / (R·T))`
//! - `dα/dt = k · α^m · (1−α)^n`
//! - `Tg = Tg0 + (Tg∞−Tg0) · λα / (1 + (λ−1)α)` (DiBenedetto)
//! - `η = η∞ · exp(Eη / (R·T)) · (αgel / (αgel−α))^C1` below the gel point

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::MaterialProperties;

/// Universal gas constant (J/(mol·K))
pub const GAS_CONSTANT: f64 = 8.314;

/// Reported viscosity once the resin has gelled (Pa·s)
pub const GELLED_VISCOSITY: f64 = 1.0e9;

/// Vitrification latches when the temperature is within this of Tg (°C)
pub const VITRIFICATION_MARGIN: f64 = 5.0;

const KELVIN_OFFSET: f64 = 273.15;

/// Temperature used for the viscosity reported before the first step (°C)
const AMBIENT_C: f64 = 25.0;

/// Rheological phase of the resin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResinPhase {
    #[default]
    Liquid,
    Gelled,
    Vitrified,
}

/// Resin state for the current cycle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CureState {
    /// Degree of cure α, `0..=1`, never decreases within a cycle
    pub degree_of_cure: f64,
    /// dα/dt at the last step (1/s)
    pub cure_rate: f64,
    /// Resin viscosity (Pa·s)
    pub viscosity: f64,
    /// Glass transition temperature (°C)
    pub glass_transition_temp: f64,
    pub gelation_reached: bool,
    /// Cycle time at which gelation latched (s)
    pub gel_time_s: Option<u32>,
    pub vitrification_reached: bool,
    /// Cycle time at which vitrification latched (s)
    pub vitrification_time_s: Option<u32>,
    pub phase: ResinPhase,
}

impl CureState {
    fn initial(material: &MaterialProperties) -> Self {
        Self {
            degree_of_cure: 0.0,
            cure_rate: 0.0,
            viscosity: viscosity(material, 0.0, AMBIENT_C),
            glass_transition_temp: material.tg_uncured,
            gelation_reached: false,
            gel_time_s: None,
            vitrification_reached: false,
            vitrification_time_s: None,
            phase: ResinPhase::Liquid,
        }
    }
}

/// Latches that fired during one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Milestones {
    pub gelation: bool,
    pub vitrification: bool,
}

/// Arrhenius rate constant `k` (1/s) at a temperature in °C
pub fn rate_constant(material: &MaterialProperties, temp_c: f64) -> f64 {
    let t_k = temp_c + KELVIN_OFFSET;
    material.pre_exponential * libm::exp(-material.activation_energy / (GAS_CONSTANT * t_k))
}

/// Kamal–Sourour cure rate dα/dt (1/s)
///
/// Exactly zero for `α <= 0` and `α >= 1`.
pub fn cure_rate(material: &MaterialProperties, alpha: f64, temp_c: f64) -> f64 {
    if !(alpha > 0.0 && alpha < 1.0) {
        return 0.0;
    }
    let k = rate_constant(material, temp_c);
    k * libm::pow(alpha, material.order_m) * libm::pow(1.0 - alpha, material.order_n)
}

/// DiBenedetto glass transition temperature (°C)
///
/// Returns `Tg0` exactly at `α <= 0` and `Tg∞` exactly at `α >= 1`.
pub fn glass_transition(material: &MaterialProperties, alpha: f64) -> f64 {
    if alpha <= 0.0 {
        return material.tg_uncured;
    }
    if alpha >= 1.0 {
        return material.tg_cured;
    }
    let lambda = material.dibenedetto_lambda;
    let fraction = lambda * alpha / (1.0 + (lambda - 1.0) * alpha);
    material.tg_uncured + (material.tg_cured - material.tg_uncured) * fraction
}

/// Resin viscosity (Pa·s), capped at [`GELLED_VISCOSITY`]
pub fn viscosity(material: &MaterialProperties, alpha: f64, temp_c: f64) -> f64 {
    let alpha_gel = material.alpha_gel;
    if alpha >= alpha_gel {
        return GELLED_VISCOSITY;
    }
    let t_k = temp_c + KELVIN_OFFSET;
    let alpha = if alpha > 0.0 { alpha } else { 0.0 };
    let thermal = libm::exp(material.viscosity_activation / (GAS_CONSTANT * t_k));
    let divergence = libm::pow(alpha_gel / (alpha_gel - alpha), material.viscosity_exponent);
    let eta = material.viscosity_inf * thermal * divergence;
    if eta.is_finite() && eta < GELLED_VISCOSITY {
        eta
    } else {
        GELLED_VISCOSITY
    }
}

/// Degree-of-cure integrator for one cycle
#[derive(Debug, Clone)]
pub struct KineticsEngine {
    material: MaterialProperties,
    state: CureState,
}

impl KineticsEngine {
    pub fn new(material: MaterialProperties) -> Self {
        Self {
            state: CureState::initial(&material),
            material,
        }
    }

    pub fn material(&self) -> &MaterialProperties {
        &self.material
    }

    pub fn state(&self) -> &CureState {
        &self.state
    }

    /// Restart for a new cycle: α back to zero, latches cleared
    pub fn reset(&mut self) {
        self.state = CureState::initial(&self.material);
    }

    /// Replace the material and restart
    pub fn set_material(&mut self, material: MaterialProperties) {
        self.material = material;
        self.reset();
    }

    /// Advance by one explicit Euler step
    ///
    /// # Arguments
    /// - `avg_temp_c`: average zone temperature
    /// - `dt_s`: integration step
    /// - `elapsed_s`: cycle time, recorded on the latches
    ///
    /// A non-finite temperature or step leaves the state untouched.
    pub fn step(&mut self, avg_temp_c: f32, dt_s: f64, elapsed_s: u32) -> Milestones {
        let temp = avg_temp_c as f64;
        if !temp.is_finite() || !dt_s.is_finite() || dt_s <= 0.0 {
            return Milestones::default();
        }

        let m = &self.material;
        let s = &mut self.state;

        // The autocatalytic law is zero at α = 0; start from the as-received cure
        let alpha_eval = if s.degree_of_cure < m.initial_cure {
            m.initial_cure
        } else {
            s.degree_of_cure
        };
        let rate = cure_rate(m, alpha_eval, temp);
        let rate = if rate.is_finite() && rate > 0.0 {
            rate
        } else {
            0.0
        };

        s.cure_rate = rate;
        s.degree_of_cure = (s.degree_of_cure + rate * dt_s).clamp(0.0, 1.0);
        s.glass_transition_temp = glass_transition(m, s.degree_of_cure);
        s.viscosity = viscosity(m, s.degree_of_cure, temp);

        let mut milestones = Milestones::default();

        if !s.gelation_reached && s.degree_of_cure >= m.alpha_gel {
            s.gelation_reached = true;
            s.gel_time_s = Some(elapsed_s);
            milestones.gelation = true;
        }

        if !s.vitrification_reached && temp <= s.glass_transition_temp + VITRIFICATION_MARGIN {
            s.vitrification_reached = true;
            s.vitrification_time_s = Some(elapsed_s);
            milestones.vitrification = true;
        }

        s.phase = if s.vitrification_reached {
            ResinPhase::Vitrified
        } else if s.gelation_reached {
            ResinPhase::Gelled
        } else {
            ResinPhase::Liquid
        };

        milestones
    }
}
