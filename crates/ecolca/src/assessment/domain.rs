use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recyclable materials with a calibrated profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Aluminum,
    Copper,
}

impl Material {
    pub const ALL: [Material; 2] = [Material::Aluminum, Material::Copper];

    pub fn as_str(&self) -> &'static str {
        match self {
            Material::Aluminum => "aluminum",
            Material::Copper => "copper",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Material::Aluminum => "Aluminum",
            Material::Copper => "Copper",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported material '{0}'")]
pub struct UnknownMaterial(pub String);

impl FromStr for Material {
    type Err = UnknownMaterial;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "aluminum" | "aluminium" | "al" => Ok(Material::Aluminum),
            "copper" | "cu" => Ok(Material::Copper),
            _ => Err(UnknownMaterial(value.to_string())),
        }
    }
}

/// Client supplied scalar, kept raw so coercion failures stay local to a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Flag(bool),
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl RawValue {
    /// Numeric reading: numbers, numeric strings, and booleans as 1/0.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            RawValue::Flag(flag) => {
                if *flag {
                    1.0
                } else {
                    0.0
                }
            }
            RawValue::Number(number) => *number,
            RawValue::Text(text) => text.trim().parse::<f64>().ok()?,
            RawValue::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            RawValue::Flag(flag) => *flag,
            RawValue::Number(number) => *number != 0.0,
            RawValue::Text(text) => !text.is_empty(),
            RawValue::Other(value) => match value {
                serde_json::Value::Null => false,
                serde_json::Value::Array(items) => !items.is_empty(),
                serde_json::Value::Object(entries) => !entries.is_empty(),
                _ => true,
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            RawValue::Flag(flag) => flag.to_string(),
            RawValue::Number(number) => number.to_string(),
            RawValue::Text(text) => format!("\"{text}\""),
            RawValue::Other(value) => value.to_string(),
        }
    }
}

/// Named fields accepted in an assessment submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputField {
    ScrapRatio,
    RecyclingRate,
    WasteRatio,
    EnergyRecoveryRate,
    SecondaryMaterialFraction,
    MaterialEfficiency,
    TotalInputs,
    TotalOutputs,
    ProductionScale,
    EnergySource,
    Location,
    IsMetallurgy,
    HasCircularity,
    ProcessDescription,
}

impl InputField {
    pub fn key(&self) -> &'static str {
        match self {
            InputField::ScrapRatio => "scrapRatio",
            InputField::RecyclingRate => "recyclingRate",
            InputField::WasteRatio => "wasteRatio",
            InputField::EnergyRecoveryRate => "energyRecoveryRate",
            InputField::SecondaryMaterialFraction => "secondaryMaterialFraction",
            InputField::MaterialEfficiency => "materialEfficiency",
            InputField::TotalInputs => "totalInputs",
            InputField::TotalOutputs => "totalOutputs",
            InputField::ProductionScale => "productionScale",
            InputField::EnergySource => "energySource",
            InputField::Location => "location",
            InputField::IsMetallurgy => "isMetallurgy",
            InputField::HasCircularity => "hasCircularity",
            InputField::ProcessDescription => "processDescription",
        }
    }

    /// Value assumed for an absent numeric field.
    pub fn default_number(&self) -> f64 {
        match self {
            InputField::TotalInputs => 100.0,
            InputField::TotalOutputs => 80.0,
            InputField::ProductionScale => 500.0,
            _ => 0.0,
        }
    }
}

/// A field was present but could not be read as a number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field '{field}' is not numeric (got {value})")]
pub struct InputConversionError {
    pub field: &'static str,
    pub value: String,
}

/// Raw process-parameter submission. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrap_ratio: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycling_rate: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waste_ratio: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_recovery_rate: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_material_fraction: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_efficiency: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_inputs: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_outputs: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_scale: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_source: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_metallurgy: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_circularity: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_description: Option<RawValue>,
}

impl AssessmentInput {
    pub fn value(&self, field: InputField) -> Option<&RawValue> {
        match field {
            InputField::ScrapRatio => self.scrap_ratio.as_ref(),
            InputField::RecyclingRate => self.recycling_rate.as_ref(),
            InputField::WasteRatio => self.waste_ratio.as_ref(),
            InputField::EnergyRecoveryRate => self.energy_recovery_rate.as_ref(),
            InputField::SecondaryMaterialFraction => self.secondary_material_fraction.as_ref(),
            InputField::MaterialEfficiency => self.material_efficiency.as_ref(),
            InputField::TotalInputs => self.total_inputs.as_ref(),
            InputField::TotalOutputs => self.total_outputs.as_ref(),
            InputField::ProductionScale => self.production_scale.as_ref(),
            InputField::EnergySource => self.energy_source.as_ref(),
            InputField::Location => self.location.as_ref(),
            InputField::IsMetallurgy => self.is_metallurgy.as_ref(),
            InputField::HasCircularity => self.has_circularity.as_ref(),
            InputField::ProcessDescription => self.process_description.as_ref(),
        }
    }

    /// Numeric value of a field, falling back to its documented default when absent.
    pub fn number(&self, field: InputField) -> Result<f64, InputConversionError> {
        match self.value(field) {
            None => Ok(field.default_number()),
            Some(raw) => raw.as_number().ok_or_else(|| InputConversionError {
                field: field.key(),
                value: raw.describe(),
            }),
        }
    }

    /// Percentage field normalized to a fraction.
    pub fn fraction(&self, field: InputField) -> Result<f64, InputConversionError> {
        Ok(self.number(field)? / 100.0)
    }

    pub fn flag(&self, field: InputField) -> bool {
        self.value(field).map(RawValue::is_truthy).unwrap_or(false)
    }

    pub fn is_present(&self, field: InputField) -> bool {
        self.value(field).is_some()
    }

    /// Present and truthy, the completeness notion used for uncertainty.
    pub fn is_populated(&self, field: InputField) -> bool {
        self.flag(field)
    }

    pub fn energy_source(&self) -> EnergySource {
        match self.energy_source.as_ref() {
            None => EnergySource::Grid,
            Some(RawValue::Text(text)) => EnergySource::parse(text),
            Some(other) => EnergySource::Other(other.describe()),
        }
    }

    pub fn location(&self) -> String {
        match self.location.as_ref() {
            None => "industrial".to_string(),
            Some(RawValue::Text(text)) => normalize_label(text),
            Some(other) => other.describe(),
        }
    }

    pub fn process_description(&self) -> Option<&str> {
        self.process_description
            .as_ref()
            .and_then(RawValue::as_text)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

pub(crate) fn normalize_label(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Energy supplying the process; anything unrecognised is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnergySource {
    Renewable,
    Grid,
    Coal,
    Gas,
    Other(String),
}

impl EnergySource {
    pub fn parse(raw: &str) -> Self {
        match normalize_label(raw).as_str() {
            "renewable" => EnergySource::Renewable,
            "grid" => EnergySource::Grid,
            "coal" => EnergySource::Coal,
            "gas" => EnergySource::Gas,
            other => EnergySource::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            EnergySource::Renewable => "renewable",
            EnergySource::Grid => "grid",
            EnergySource::Coal => "coal",
            EnergySource::Gas => "gas",
            EnergySource::Other(label) => label.as_str(),
        }
    }

    pub fn is_renewable(&self) -> bool {
        matches!(self, EnergySource::Renewable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircularityMetrics {
    pub circularity_index: f64,
    pub recycling_rate: f64,
    pub waste_ratio: f64,
    pub material_efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessClassification {
    #[serde(rename = "class")]
    pub class_name: String,
    pub class_id: u32,
    pub confidence: f64,
}

/// Model outputs, each either live or a documented default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSet {
    pub environmental_efficiency: f64,
    pub circularity_metrics: CircularityMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_classification: Option<ProcessClassification>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LcaMetrics {
    pub carbon_footprint: f64,
    pub energy_consumption: f64,
    pub water_usage: f64,
}

/// Whether a value came from a live oracle or was substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    Live,
    Default { reason: String },
}

impl Provenance {
    pub fn is_live(&self) -> bool {
        matches!(self, Provenance::Live)
    }
}

/// Result of a single pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    Live(T),
    Defaulted { value: T, reason: String },
}

impl<T> StageOutcome<T> {
    pub fn defaulted(value: T, reason: impl fmt::Display) -> Self {
        StageOutcome::Defaulted {
            value,
            reason: reason.to_string(),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            StageOutcome::Live(value) | StageOutcome::Defaulted { value, .. } => value,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, StageOutcome::Live(_))
    }

    pub fn into_parts(self) -> (T, Provenance) {
        match self {
            StageOutcome::Live(value) => (value, Provenance::Live),
            StageOutcome::Defaulted { value, reason } => (value, Provenance::Default { reason }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionProvenance {
    pub environmental_efficiency: Provenance,
    pub circularity_metrics: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_classification: Option<Provenance>,
    pub lca_metrics: Provenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionUncertainty {
    pub confidence: f64,
    pub uncertainty_range: f64,
    pub confidence_interval: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub overall_score: f64,
    pub environmental_score: f64,
    pub circularity_score: f64,
    pub evaluation_method: String,
    pub feedback: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    EnergyTransition,
    RecycledContent,
    ProcessOptimization,
    WaterRecycling,
    BestPractice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: RecommendationKind,
    pub message: String,
}

/// One narrative per prediction category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanations {
    pub environmental: String,
    pub circularity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
}

/// Verdict of the claims collaborator on the free-text description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimVerdict {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub success: bool,
    pub material_type: Material,
    pub using_ml_models: bool,
    pub model_version: String,
    pub data_quality: String,
    pub predictions: PredictionSet,
    pub lca_metrics: LcaMetrics,
    pub evaluation: Evaluation,
    pub uncertainty: BTreeMap<String, PredictionUncertainty>,
    pub explanations: Explanations,
    pub explanation_backend: String,
    pub recommendations: Vec<Recommendation>,
    pub provenance: PredictionProvenance,
    pub enhanced_features: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<ClaimVerdict>,
    pub timestamp: DateTime<Utc>,
}
