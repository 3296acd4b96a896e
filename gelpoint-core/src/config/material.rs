//! Resin material model
//!
//! Kinetic and thermal constants for one resin system. All values are SI:
//! energies in J/mol, the pre-exponential factor in 1/s, viscosity in Pa·s
//! and temperatures in °C.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Material constants, immutable for the duration of a cycle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaterialProperties {
    /// Arrhenius pre-exponential factor A (1/s)
    pub pre_exponential: f64,
    /// Activation energy Ea (J/mol)
    pub activation_energy: f64,
    /// Autocatalytic order m
    pub order_m: f64,
    /// Reaction order n
    pub order_n: f64,
    /// Glass transition of the uncured resin Tg0 (°C)
    pub tg_uncured: f64,
    /// Glass transition of the fully cured resin Tg∞ (°C)
    pub tg_cured: f64,
    /// DiBenedetto parameter λ
    pub dibenedetto_lambda: f64,
    /// Viscosity at infinite temperature η∞ (Pa·s)
    pub viscosity_inf: f64,
    /// Viscosity activation energy Eη (J/mol)
    pub viscosity_activation: f64,
    /// Degree of cure at the gel point αgel
    pub alpha_gel: f64,
    /// Viscosity divergence exponent C1
    pub viscosity_exponent: f64,
    /// As-received advancement of the prepreg
    ///
    /// The autocatalytic rate law is zero at α = 0, so the kinetics engine
    /// evaluates it no lower than this value.
    pub initial_cure: f64,
}

impl MaterialProperties {
    /// Generic 177 °C-cure toughened aerospace epoxy prepreg
    pub const fn toughened_epoxy() -> Self {
        Self {
            pre_exponential: 1.5e5,
            activation_energy: 66_500.0,
            order_m: 0.5,
            order_n: 1.5,
            tg_uncured: -10.0,
            tg_cured: 210.0,
            dibenedetto_lambda: 0.45,
            viscosity_inf: 1.0e-11,
            viscosity_activation: 90_000.0,
            alpha_gel: 0.47,
            viscosity_exponent: 2.0,
            initial_cure: 0.01,
        }
    }

    /// Low-temperature (120 °C-cure) tooling epoxy
    pub const fn tooling_epoxy() -> Self {
        Self {
            pre_exponential: 2.0e6,
            activation_energy: 72_000.0,
            order_m: 0.6,
            order_n: 1.4,
            tg_uncured: -15.0,
            tg_cured: 145.0,
            dibenedetto_lambda: 0.5,
            viscosity_inf: 5.0e-12,
            viscosity_activation: 85_000.0,
            alpha_gel: 0.55,
            viscosity_exponent: 1.8,
            initial_cure: 0.02,
        }
    }

    /// Check the constants for physically meaningful values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            self.pre_exponential,
            self.activation_energy,
            self.viscosity_inf,
            self.viscosity_activation,
        ];
        if positive.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(ConfigError::InvalidMaterial);
        }

        let non_negative = [self.order_m, self.order_n, self.viscosity_exponent];
        if non_negative.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigError::InvalidMaterial);
        }

        if !(self.alpha_gel > 0.0 && self.alpha_gel < 1.0) {
            return Err(ConfigError::InvalidMaterial);
        }

        if !(self.initial_cure >= 0.0 && self.initial_cure < self.alpha_gel) {
            return Err(ConfigError::InvalidMaterial);
        }

        if !(self.dibenedetto_lambda > 0.0 && self.dibenedetto_lambda <= 1.0) {
            return Err(ConfigError::InvalidMaterial);
        }

        if !self.tg_uncured.is_finite() || !(self.tg_cured > self.tg_uncured) {
            return Err(ConfigError::InvalidMaterial);
        }

        Ok(())
    }
}

impl Default for MaterialProperties {
    fn default() -> Self {
        Self::toughened_epoxy()
    }
}
