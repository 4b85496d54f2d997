//! Closed-form carbon, energy and water estimates.

use tracing::warn;

use super::domain::{
    AssessmentInput, InputConversionError, InputField, LcaMetrics, PredictionSet, StageOutcome,
};
use super::profile::MaterialProfile;

const MJ_PER_GJ: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    #[error(transparent)]
    Input(#[from] InputConversionError),
    #[error("{0} evaluated to a non-finite value")]
    NonFinite(&'static str),
}

/// Derives physical metrics, substituting the profile fallback when derivation fails.
pub fn estimate_lca_metrics(
    input: &AssessmentInput,
    predictions: &PredictionSet,
    profile: &MaterialProfile,
) -> StageOutcome<LcaMetrics> {
    match derive(input, predictions.environmental_efficiency, profile) {
        Ok(metrics) => StageOutcome::Live(metrics),
        Err(err) => {
            warn!(material = %profile.material, error = %err, "physical metrics fell back to constants");
            StageOutcome::defaulted(profile.fallback_metrics, err)
        }
    }
}

fn derive(
    input: &AssessmentInput,
    environmental_efficiency: f64,
    profile: &MaterialProfile,
) -> Result<LcaMetrics, MetricsError> {
    let scale = input.number(InputField::ProductionScale)?;
    let source = input.energy_source();

    let specific_energy =
        profile.base_energy.get(&source) * (profile.efficiency_amplifier - environmental_efficiency);
    let total_energy_gj = specific_energy * scale;
    let carbon = total_energy_gj * profile.emission_factor.get(&source)
        + scale * profile.process_emission;

    let water_multiplier = if source.is_renewable() {
        profile.renewable_water_multiplier
    } else {
        1.0
    };
    let water = scale
        * (profile.water_base + profile.water_spread * (1.0 - environmental_efficiency))
        * water_multiplier;

    Ok(LcaMetrics {
        carbon_footprint: finalize("carbon_footprint", carbon)?,
        energy_consumption: finalize("energy_consumption", total_energy_gj * MJ_PER_GJ)?,
        water_usage: finalize("water_usage", water)?,
    })
}

fn finalize(name: &'static str, value: f64) -> Result<f64, MetricsError> {
    if !value.is_finite() {
        return Err(MetricsError::NonFinite(name));
    }
    Ok(round2(value.max(0.0)))
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
