//! Opaque predictors consumed by the pipeline.
//!
//! Oracles are loaded once per material and shared read-only between requests. Any oracle
//! may be missing; the pipeline treats absence exactly like a failed inference.

mod linear;
mod registry;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::encoder::CategoricalEncoder;
use super::features::{FeatureVector, ModelKind};

pub use linear::{Activation, LinearHead, LinearModelArtifact, LinearOracle};
pub use registry::{
    load_oracle_set, ArtifactError, ArtifactLocator, ModelRegistry, OracleCatalog,
};

/// Prediction capability of a trained model.
pub trait ModelOracle: Send + Sync + fmt::Debug {
    fn kind(&self) -> ModelKind;

    /// Number of features the model was trained on.
    fn expected_arity(&self) -> usize;

    fn predict(&self, features: &FeatureVector) -> Result<Vec<f64>, OracleError>;

    /// Maps a class id back to its training label. Only classifiers carry a decoder.
    fn decode(&self, label_id: u32) -> Result<String, OracleError> {
        Err(OracleError::UnknownLabel(label_id))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    #[error("{0} oracle is not loaded")]
    Unavailable(ModelKind),
    #[error("oracle expects {expected} features but received {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("oracle returned no finite output")]
    InvalidOutput,
    #[error("oracle did not answer within {0:?}")]
    Timeout(Duration),
    #[error("label {0} could not be decoded")]
    UnknownLabel(u32),
}

/// Runs a prediction on the blocking pool, bounded by `deadline`.
pub async fn invoke(
    oracle: Arc<dyn ModelOracle>,
    features: FeatureVector,
    deadline: Duration,
) -> Result<Vec<f64>, OracleError> {
    if features.len() != oracle.expected_arity() {
        return Err(OracleError::ArityMismatch {
            expected: oracle.expected_arity(),
            actual: features.len(),
        });
    }

    let task = tokio::task::spawn_blocking(move || oracle.predict(&features));
    let output = match tokio::time::timeout(deadline, task).await {
        Ok(Ok(result)) => result?,
        Ok(Err(join)) => return Err(OracleError::Inference(join.to_string())),
        Err(_) => return Err(OracleError::Timeout(deadline)),
    };

    if output.is_empty() || output.iter().any(|value| !value.is_finite()) {
        return Err(OracleError::InvalidOutput);
    }
    Ok(output)
}

/// Every oracle and encoder loaded for one material.
#[derive(Debug, Clone, Default)]
pub struct OracleSet {
    pub environmental: Option<Arc<dyn ModelOracle>>,
    pub circularity: Option<Arc<dyn ModelOracle>>,
    pub classification: Option<Arc<dyn ModelOracle>>,
    pub encoder: CategoricalEncoder,
    pub classification_decoder: bool,
    pub version: String,
}

impl OracleSet {
    pub fn empty(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, kind: ModelKind) -> Option<Arc<dyn ModelOracle>> {
        match kind {
            ModelKind::Environmental => self.environmental.clone(),
            ModelKind::Circularity => self.circularity.clone(),
            ModelKind::Classification => self.classification.clone(),
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn ModelOracle>) -> Self {
        match oracle.kind() {
            ModelKind::Environmental => self.environmental = Some(oracle),
            ModelKind::Circularity => self.circularity = Some(oracle),
            ModelKind::Classification => self.classification = Some(oracle),
        }
        self
    }

    pub fn with_encoder(mut self, encoder: CategoricalEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            environmental_model: self.environmental.is_some(),
            circularity_model: self.circularity.is_some(),
            classification_model: self.classification.is_some(),
            classification_encoder: self.classification_decoder,
            energy_encoder: self.encoder.has_energy_encoder(),
            location_encoder: self.encoder.has_location_encoder(),
        }
    }
}

/// Availability of each artifact, reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelStatus {
    pub environmental_model: bool,
    pub circularity_model: bool,
    pub classification_model: bool,
    pub classification_encoder: bool,
    pub energy_encoder: bool,
    pub location_encoder: bool,
}

impl ModelStatus {
    pub fn any_loaded(&self) -> bool {
        self.environmental_model || self.circularity_model || self.classification_model
    }

    pub fn ml_ready(&self) -> bool {
        self.environmental_model
            && self.circularity_model
            && self.classification_model
            && self.classification_encoder
    }
}
