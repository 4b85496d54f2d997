use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::{AssessmentInput, InputConversionError, InputField};
use super::encoder::{CategoricalEncoder, CategoryKind};
use super::profile::MaterialProfile;

/// The three oracle families a profile can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Environmental,
    Circularity,
    Classification,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::Environmental,
        ModelKind::Circularity,
        ModelKind::Classification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Environmental => "environmental",
            ModelKind::Circularity => "circularity",
            ModelKind::Classification => "classification",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column of a trained model's input schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureColumn {
    /// Percentage divided by 100.
    Fraction(InputField),
    /// Passed through unchanged.
    Scale(InputField),
    /// `ln(1 + x)` to tame large magnitudes.
    LogScale(InputField),
    /// Truthiness as 1/0.
    Flag(InputField),
    /// Profile base energy for the submitted source.
    SpecificEnergy,
    /// `1 / (specific_energy + 0.1)`.
    EnergyEfficiencyProxy,
    EnergyCode,
    LocationCode,
}

/// Fixed-order numeric input for one oracle call.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    kind: ModelKind,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(kind: ModelKind, values: Vec<f64>) -> Self {
        Self { kind, values }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Builds feature vectors for a material from raw submissions.
pub struct FeatureDeriver<'a> {
    profile: &'a MaterialProfile,
    encoder: &'a CategoricalEncoder,
}

impl<'a> FeatureDeriver<'a> {
    pub fn new(profile: &'a MaterialProfile, encoder: &'a CategoricalEncoder) -> Self {
        Self { profile, encoder }
    }

    pub fn schema(&self, kind: ModelKind) -> &'static [FeatureColumn] {
        match kind {
            ModelKind::Environmental | ModelKind::Classification => {
                self.profile.environmental_schema
            }
            ModelKind::Circularity => self.profile.circularity_schema,
        }
    }

    /// A conversion error makes the vector unavailable for this kind only.
    pub fn derive(
        &self,
        input: &AssessmentInput,
        kind: ModelKind,
    ) -> Result<FeatureVector, InputConversionError> {
        let values = self
            .schema(kind)
            .iter()
            .map(|column| self.column(input, *column))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FeatureVector::new(kind, values))
    }

    fn column(
        &self,
        input: &AssessmentInput,
        column: FeatureColumn,
    ) -> Result<f64, InputConversionError> {
        let value = match column {
            FeatureColumn::Fraction(field) => input.fraction(field)?,
            FeatureColumn::Scale(field) => input.number(field)?,
            FeatureColumn::LogScale(field) => {
                let raw = input.number(field)?;
                let logged = raw.ln_1p();
                if !logged.is_finite() {
                    return Err(InputConversionError {
                        field: field.key(),
                        value: raw.to_string(),
                    });
                }
                logged
            }
            FeatureColumn::Flag(field) => flag_value(input.flag(field)),
            FeatureColumn::SpecificEnergy => self.specific_energy(input),
            FeatureColumn::EnergyEfficiencyProxy => 1.0 / (self.specific_energy(input) + 0.1),
            FeatureColumn::EnergyCode => f64::from(
                self.encoder
                    .encode(CategoryKind::EnergySource, input.energy_source().label()),
            ),
            FeatureColumn::LocationCode => {
                f64::from(self.encoder.encode(CategoryKind::Location, &input.location()))
            }
        };
        Ok(value)
    }

    fn specific_energy(&self, input: &AssessmentInput) -> f64 {
        self.profile.base_energy.get(&input.energy_source())
    }
}

fn flag_value(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}
