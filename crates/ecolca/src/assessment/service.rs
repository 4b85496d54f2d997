use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::claims::{ClaimsAnalyzer, LexiconClaimsAnalyzer};
use super::domain::{AssessmentInput, AssessmentResult, Material};
use super::enhancer::FeatureEnhancer;
use super::explanation::ExplanationBackend;
use super::oracle::{ArtifactError, ModelRegistry, ModelStatus};
use super::pipeline::{AssessmentPipeline, DEFAULT_ORACLE_TIMEOUT};
use crate::config::AssessmentConfig;

/// Pipeline knobs shared by every request.
#[derive(Debug, Clone)]
pub struct AssessmentSettings {
    pub default_material: Material,
    pub oracle_timeout: Duration,
    pub explainer: ExplanationBackend,
    pub enhancer: FeatureEnhancer,
    pub claims: Option<Arc<dyn ClaimsAnalyzer>>,
}

impl Default for AssessmentSettings {
    fn default() -> Self {
        Self {
            default_material: Material::Aluminum,
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
            explainer: ExplanationBackend::Templated,
            enhancer: FeatureEnhancer::Basic,
            claims: Some(Arc::new(LexiconClaimsAnalyzer::default())),
        }
    }
}

impl AssessmentSettings {
    pub fn from_config(config: &AssessmentConfig) -> Self {
        let explainer = ExplanationBackend::from_settings(
            config.explanation_backend,
            config.generative_command.as_deref(),
        );
        // generated narratives pair with the richer feature set
        let enhancer = match explainer {
            ExplanationBackend::Generative(_) => FeatureEnhancer::Generative,
            ExplanationBackend::Templated => FeatureEnhancer::Basic,
        };
        Self {
            default_material: config.default_material,
            oracle_timeout: config.oracle_timeout,
            explainer,
            enhancer,
            ..Self::default()
        }
    }
}

/// A validated submission envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentRequest {
    pub material: Material,
    pub input: AssessmentInput,
}

impl AssessmentRequest {
    /// Reads `{"assessment_data": {...}, "material"?: "..."}`.
    pub fn from_envelope(envelope: Value, default_material: Material) -> Result<Self, EnvelopeError> {
        let Value::Object(mut envelope) = envelope else {
            return Err(EnvelopeError::NotAnObject);
        };

        let material = match envelope.remove("material") {
            None | Some(Value::Null) => default_material,
            Some(Value::String(raw)) => raw
                .parse::<Material>()
                .map_err(|_| EnvelopeError::UnknownMaterial(raw))?,
            Some(other) => return Err(EnvelopeError::UnknownMaterial(other.to_string())),
        };

        let data = match envelope.remove("assessment_data") {
            None | Some(Value::Null) => return Err(EnvelopeError::MissingAssessmentData),
            Some(data @ Value::Object(_)) => data,
            Some(_) => {
                return Err(EnvelopeError::InvalidAssessmentData(
                    "assessment_data must be an object".to_string(),
                ))
            }
        };
        let input = serde_json::from_value(data)
            .map_err(|err| EnvelopeError::InvalidAssessmentData(err.to_string()))?;

        Ok(Self { material, input })
    }
}

/// Malformed submission; the only failure surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("request body must be a JSON object")]
    NotAnObject,
    #[error("missing assessment_data")]
    MissingAssessmentData,
    #[error("invalid assessment_data: {0}")]
    InvalidAssessmentData(String),
    #[error("unsupported material '{0}'")]
    UnknownMaterial(String),
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error(transparent)]
    Artifacts(#[from] ArtifactError),
    #[error("model reload task failed: {0}")]
    ReloadTask(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialHealth {
    pub model_timestamp: String,
    pub model_status: ModelStatus,
    pub models_loaded: bool,
    pub ml_ready: bool,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub success: bool,
    pub message: String,
    pub default_material: Material,
    pub models_loaded: bool,
    pub model_status: ModelStatus,
    pub model_timestamp: String,
    pub ml_ready: bool,
    pub materials: BTreeMap<Material, MaterialHealth>,
    pub timestamp: DateTime<Utc>,
}

/// Service composing the model registry with per-request pipelines.
#[derive(Debug)]
pub struct AssessmentService {
    registry: Arc<ModelRegistry>,
    settings: AssessmentSettings,
}

impl AssessmentService {
    pub fn new(registry: Arc<ModelRegistry>, settings: AssessmentSettings) -> Self {
        Self { registry, settings }
    }

    /// Loads artifacts from the configured model directory.
    pub fn from_config(config: &AssessmentConfig) -> Self {
        let registry = ModelRegistry::from_directory(
            config.model_dir.clone(),
            config.model_timestamps.clone(),
        );
        Self::new(Arc::new(registry), AssessmentSettings::from_config(config))
    }

    pub fn default_material(&self) -> Material {
        self.settings.default_material
    }

    /// Pipeline bound to the current oracle snapshot.
    pub fn pipeline(&self, material: Material) -> AssessmentPipeline {
        let oracles = self.registry.snapshot().get(material);
        let pipeline = AssessmentPipeline::new(material, oracles)
            .with_explainer(self.settings.explainer.clone())
            .with_enhancer(self.settings.enhancer)
            .with_oracle_timeout(self.settings.oracle_timeout);
        match &self.settings.claims {
            Some(analyzer) => pipeline.with_claims_analyzer(Arc::clone(analyzer)),
            None => pipeline,
        }
    }

    pub async fn submit(&self, request: AssessmentRequest) -> AssessmentResult {
        self.pipeline(request.material).assess(&request.input).await
    }

    /// Parses an envelope and runs the assessment.
    pub async fn submit_envelope(&self, envelope: Value) -> Result<AssessmentResult, AssessmentError> {
        let request = AssessmentRequest::from_envelope(envelope, self.default_material())?;
        Ok(self.submit(request).await)
    }

    pub fn status(&self) -> HealthReport {
        let catalog = self.registry.snapshot();
        let materials: BTreeMap<Material, MaterialHealth> = Material::ALL
            .into_iter()
            .map(|material| {
                let set = catalog.get(material);
                let status = set.status();
                (
                    material,
                    MaterialHealth {
                        model_timestamp: set.version.clone(),
                        model_status: status,
                        models_loaded: status.any_loaded(),
                        ml_ready: status.ml_ready(),
                    },
                )
            })
            .collect();

        let default_material = self.default_material();
        let primary = catalog.get(default_material);
        let status = primary.status();
        HealthReport {
            success: true,
            message: format!("{} LCA assessment service is running", default_material.title()),
            default_material,
            models_loaded: status.any_loaded(),
            model_status: status,
            model_timestamp: primary.version.clone(),
            ml_ready: status.ml_ready(),
            materials,
            timestamp: Utc::now(),
        }
    }

    /// Reloads artifacts from disk off the async runtime and reports the new state.
    pub async fn reload(&self) -> Result<HealthReport, AssessmentError> {
        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || registry.reload())
            .await
            .map_err(|err| AssessmentError::ReloadTask(err.to_string()))??;
        Ok(self.status())
    }
}
