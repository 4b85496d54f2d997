use std::collections::BTreeMap;

use super::domain::{AssessmentInput, InputField, PredictionSet, PredictionUncertainty};

/// Fields whose presence drives prediction confidence.
pub const REQUIRED_FIELDS: [InputField; 6] = [
    InputField::ScrapRatio,
    InputField::RecyclingRate,
    InputField::MaterialEfficiency,
    InputField::EnergySource,
    InputField::TotalInputs,
    InputField::TotalOutputs,
];

const CONFIDENCE_FLOOR: f64 = 0.5;

/// Share of required fields that are present and truthy.
pub fn completeness(input: &AssessmentInput) -> f64 {
    let populated = REQUIRED_FIELDS
        .iter()
        .filter(|field| input.is_populated(**field))
        .count();
    populated as f64 / REQUIRED_FIELDS.len() as f64
}

pub fn quantify(prediction: f64, completeness: f64) -> PredictionUncertainty {
    let uncertainty = 0.1 * (2.0 - completeness);
    let confidence = (1.0 - uncertainty).max(CONFIDENCE_FLOOR);

    let confidence_interval = if (0.0..=1.0).contains(&prediction) {
        [
            (prediction - uncertainty).max(0.0),
            (prediction + uncertainty).min(1.0),
        ]
    } else {
        let spread = uncertainty * prediction.abs();
        [prediction - spread, prediction + spread]
    };

    PredictionUncertainty {
        confidence,
        uncertainty_range: uncertainty,
        confidence_interval,
    }
}

/// Uncertainty for the environmental efficiency and circularity index predictions.
pub fn quantify_predictions(
    input: &AssessmentInput,
    predictions: &PredictionSet,
) -> BTreeMap<String, PredictionUncertainty> {
    let completeness = completeness(input);
    BTreeMap::from([
        (
            "environmental_efficiency".to_string(),
            quantify(predictions.environmental_efficiency, completeness),
        ),
        (
            "circularity_index".to_string(),
            quantify(
                predictions.circularity_metrics.circularity_index,
                completeness,
            ),
        ),
    ])
}
