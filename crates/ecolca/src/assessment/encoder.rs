use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::normalize_label;

/// Trained label encoder artifact: classes listed in code order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn transform(&self, value: &str) -> Result<u32, EncodingFallback> {
        let wanted = normalize_label(value);
        self.classes
            .iter()
            .position(|class| normalize_label(class) == wanted)
            .map(|index| index as u32)
            .ok_or(EncodingFallback::Unseen(wanted))
    }

    pub fn inverse_transform(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }
}

/// Reason the static map answered instead of a trained encoder. Never surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingFallback {
    #[error("no trained encoder loaded")]
    Untrained,
    #[error("category '{0}' was not seen during training")]
    Unseen(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    EnergySource,
    Location,
}

impl CategoryKind {
    fn static_code(&self, value: &str) -> Option<u32> {
        let code = match (self, value) {
            (CategoryKind::EnergySource, "renewable") => 0,
            (CategoryKind::EnergySource, "grid") => 1,
            (CategoryKind::EnergySource, "coal") => 2,
            (CategoryKind::EnergySource, "gas") => 3,
            (CategoryKind::Location, "urban") => 0,
            (CategoryKind::Location, "industrial") => 1,
            (CategoryKind::Location, "remote") => 2,
            _ => return None,
        };
        Some(code)
    }

    /// Code for the grid / industrial baseline.
    fn baseline_code(&self) -> u32 {
        1
    }
}

/// Maps open-vocabulary categorical fields to integer codes.
#[derive(Debug, Clone, Default)]
pub struct CategoricalEncoder {
    energy: Option<Arc<LabelEncoder>>,
    location: Option<Arc<LabelEncoder>>,
}

impl CategoricalEncoder {
    pub fn new(energy: Option<LabelEncoder>, location: Option<LabelEncoder>) -> Self {
        Self {
            energy: energy.map(Arc::new),
            location: location.map(Arc::new),
        }
    }

    pub fn has_energy_encoder(&self) -> bool {
        self.energy.is_some()
    }

    pub fn has_location_encoder(&self) -> bool {
        self.location.is_some()
    }

    /// Trained encoder first, static map second, baseline code last.
    pub fn encode(&self, kind: CategoryKind, value: &str) -> u32 {
        let trained = match kind {
            CategoryKind::EnergySource => self.energy.as_deref(),
            CategoryKind::Location => self.location.as_deref(),
        };

        let fallback = match trained {
            Some(encoder) => match encoder.transform(value) {
                Ok(code) => return code,
                Err(fallback) => fallback,
            },
            None => EncodingFallback::Untrained,
        };

        let label = normalize_label(value);
        let code = kind
            .static_code(&label)
            .unwrap_or_else(|| kind.baseline_code());
        debug!(?kind, value = %label, code, reason = %fallback, "categorical encoder fell back to static map");
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_map_covers_documented_categories() {
        let encoder = CategoricalEncoder::default();
        assert_eq!(encoder.encode(CategoryKind::EnergySource, "renewable"), 0);
        assert_eq!(encoder.encode(CategoryKind::EnergySource, "Gas"), 3);
        assert_eq!(encoder.encode(CategoryKind::Location, "remote"), 2);
    }

    #[test]
    fn unseen_values_fall_back_to_baseline() {
        let encoder = CategoricalEncoder::default();
        assert_eq!(encoder.encode(CategoryKind::EnergySource, "fusion"), 1);
        assert_eq!(encoder.encode(CategoryKind::Location, "orbital"), 1);
    }

    #[test]
    fn trained_encoder_takes_precedence() {
        let encoder = CategoricalEncoder::new(
            Some(LabelEncoder::new(["coal", "gas", "grid", "renewable"])),
            None,
        );
        assert_eq!(encoder.encode(CategoryKind::EnergySource, "renewable"), 3);
        assert_eq!(encoder.encode(CategoryKind::EnergySource, "coal"), 0);
        // trained encoder rejects it, static map still knows it
        let partial = CategoricalEncoder::new(Some(LabelEncoder::new(["grid"])), None);
        assert_eq!(partial.encode(CategoryKind::EnergySource, "gas"), 3);
    }

    #[test]
    fn label_encoder_round_trips_codes() {
        let encoder = LabelEncoder::new(["primary", "secondary"]);
        assert_eq!(encoder.transform("Secondary"), Ok(1));
        assert_eq!(encoder.inverse_transform(0), Some("primary"));
        assert_eq!(encoder.inverse_transform(7), None);
        assert_eq!(
            encoder.transform("tertiary"),
            Err(EncodingFallback::Unseen("tertiary".to_string()))
        );
    }
}
