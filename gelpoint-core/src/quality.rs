//! Quality predictor
//!
//! Derives part-quality estimates from the current zone and vacuum state.
//! Nothing here is stateful; metrics are recomputed from scratch every
//! control tick.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::FULL_VACUUM_MMHG;
use crate::control::{average_temperature, temperature_spread, VacuumPressureState, ZoneLoop};

/// Pass thresholds
pub const MAX_TEMPERATURE_DEVIATION: f32 = 5.0;
pub const MIN_VACUUM_STABILITY: f32 = 95.0;
pub const MIN_CURE_UNIFORMITY: f32 = 90.0;
pub const MAX_POROSITY_PERCENT: f32 = 2.0;

/// Derived quality snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QualityMetrics {
    /// Worst zone |measured − setpoint| (°C)
    pub temperature_deviation: f32,
    /// 0..=100
    pub vacuum_stability: f32,
    /// 0..=100
    pub cure_uniformity: f32,
    /// Void content estimate (%)
    pub predicted_porosity: f32,
    /// MPa
    pub residual_stress: f32,
    /// mm
    pub warpage: f32,
    /// Mean of the four sub-scores, 0..=100
    pub overall_score: f32,
    pub meets_spec: bool,
}

/// Compute the quality metrics for the current state
pub fn assess(zones: &[ZoneLoop], vacuum: &VacuumPressureState) -> QualityMetrics {
    let temperature_deviation = zones
        .iter()
        .map(|z| z.deviation())
        .fold(0.0f32, |acc, d| if d > acc { d } else { acc });

    let vacuum_stability = if vacuum.integrity {
        100.0
    } else {
        let leak = if vacuum.leak_rate < 0.0 {
            -vacuum.leak_rate
        } else {
            vacuum.leak_rate
        };
        (100.0 - leak).max(0.0)
    };

    let cure_uniformity = cure_uniformity(zones);

    let avg_vacuum = if vacuum.vacuum_measured.is_finite() {
        vacuum.vacuum_measured
    } else {
        0.0
    };
    let predicted_porosity = ((FULL_VACUUM_MMHG - avg_vacuum) / FULL_VACUUM_MMHG * 2.0
        + temperature_deviation * 0.1)
        .max(0.0);

    let residual_stress = (95.0 - cure_uniformity).max(0.0) * 2.0;
    let warpage = residual_stress * 0.1;

    let scores = [
        score(100.0 - 10.0 * temperature_deviation),
        score(vacuum_stability),
        score(cure_uniformity),
        score(100.0 - 25.0 * predicted_porosity),
    ];
    let overall_score = scores.iter().sum::<f32>() / scores.len() as f32;

    let meets_spec = temperature_deviation < MAX_TEMPERATURE_DEVIATION
        && vacuum_stability > MIN_VACUUM_STABILITY
        && cure_uniformity > MIN_CURE_UNIFORMITY
        && predicted_porosity < MAX_POROSITY_PERCENT;

    QualityMetrics {
        temperature_deviation,
        vacuum_stability,
        cure_uniformity,
        predicted_porosity,
        residual_stress,
        warpage,
        overall_score,
        meets_spec,
    }
}

/// Zone spread relative to the mean temperature, as a 0..=100 score
fn cure_uniformity(zones: &[ZoneLoop]) -> f32 {
    let avg = average_temperature(zones);
    if !avg.is_finite() || (avg < 1.0 && avg > -1.0) {
        return 100.0;
    }
    let (lo, hi) = temperature_spread(zones);
    score(100.0 * (1.0 - (hi - lo) / avg))
}

fn score(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
