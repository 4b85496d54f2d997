use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{AssessmentInput, InputConversionError, InputField};

/// Derived domain indicators reported alongside predictions.
///
/// Enhanced features are informational; they never change the vectors sent to oracles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureEnhancer {
    #[default]
    Basic,
    Generative,
}

impl FeatureEnhancer {
    pub fn enhance(&self, input: &AssessmentInput) -> BTreeMap<String, f64> {
        let mut features = basic_features(input);
        if *self == FeatureEnhancer::Generative {
            match synergy_features(input) {
                Ok(extra) => features.extend(extra),
                Err(err) => debug!(error = %err, "generative enhancement skipped"),
            }
        }
        features
    }
}

fn basic_features(input: &AssessmentInput) -> BTreeMap<String, f64> {
    let mut features = BTreeMap::new();

    if input.is_present(InputField::ScrapRatio) && input.is_present(InputField::RecyclingRate) {
        if let (Ok(scrap), Ok(recycling)) = (
            input.fraction(InputField::ScrapRatio),
            input.fraction(InputField::RecyclingRate),
        ) {
            features.insert(
                "sustainability_composite".to_string(),
                (scrap + recycling) / 2.0,
            );
        }
    }

    if input.is_present(InputField::EnergySource) {
        let factor = match input.energy_source().label() {
            "renewable" => 0.9,
            "grid" => 0.6,
            "coal" => 0.3,
            "gas" => 0.4,
            _ => 0.5,
        };
        features.insert("energy_efficiency_factor".to_string(), factor);
    }

    features
}

fn synergy_features(
    input: &AssessmentInput,
) -> Result<BTreeMap<String, f64>, InputConversionError> {
    let mut features = BTreeMap::new();
    if !(input.is_present(InputField::MaterialEfficiency)
        && input.is_present(InputField::SecondaryMaterialFraction))
    {
        return Ok(features);
    }

    let material_efficiency = input.fraction(InputField::MaterialEfficiency)?;
    let secondary = input.fraction(InputField::SecondaryMaterialFraction)?;
    let total_inputs = input.number(InputField::TotalInputs)?;
    let total_outputs = input.number(InputField::TotalOutputs)?;

    features.insert(
        "circularity_synergy".to_string(),
        material_efficiency * secondary * 1.2,
    );
    let complexity = (total_inputs / total_outputs.max(1.0)).ln_1p();
    if complexity.is_finite() {
        features.insert("process_complexity".to_string(), complexity);
    }
    Ok(features)
}
