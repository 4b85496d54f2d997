//! Material recycling life-cycle assessment.
//!
//! A submission flows through feature derivation, oracle predictions, physical metric
//! estimation, uncertainty, recommendations and explanations. Every prediction stage may
//! degrade to a documented per-material default; only a malformed envelope is rejected.

pub mod claims;
pub mod domain;
pub mod encoder;
pub mod enhancer;
pub mod explanation;
pub mod features;
pub mod metrics;
pub mod oracle;
pub mod pipeline;
pub mod profile;
pub mod recommendations;
pub mod router;
pub mod service;
pub mod uncertainty;

#[cfg(test)]
mod tests;

pub use claims::{ClaimsAnalyzer, ClaimsError, LexiconClaimsAnalyzer};
pub use domain::{
    AssessmentInput, AssessmentResult, CircularityMetrics, ClaimVerdict, EnergySource,
    Evaluation, Explanations, InputConversionError, InputField, LcaMetrics, Material,
    PredictionProvenance, PredictionSet, PredictionUncertainty, ProcessClassification,
    Provenance, RawValue, Recommendation, RecommendationKind, StageOutcome, UnknownMaterial,
};
pub use encoder::{CategoricalEncoder, CategoryKind, EncodingFallback, LabelEncoder};
pub use enhancer::FeatureEnhancer;
pub use explanation::{
    CommandTextGenerator, ExplanationBackend, ExplanationBackendKind, Generation,
    GenerationError, TextGenerator,
};
pub use features::{FeatureDeriver, FeatureVector, ModelKind};
pub use oracle::{
    ArtifactError, ArtifactLocator, ModelOracle, ModelRegistry, ModelStatus, OracleCatalog,
    OracleError, OracleSet,
};
pub use pipeline::AssessmentPipeline;
pub use profile::MaterialProfile;
pub use router::assessment_router;
pub use service::{
    AssessmentError, AssessmentRequest, AssessmentService, AssessmentSettings, EnvelopeError,
    HealthReport,
};
