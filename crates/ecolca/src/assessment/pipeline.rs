use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::claims::ClaimsAnalyzer;
use super::domain::{
    AssessmentInput, AssessmentResult, CircularityMetrics, ClaimVerdict, Evaluation, InputField,
    InputConversionError, Material, PredictionProvenance, PredictionSet, ProcessClassification,
    StageOutcome,
};
use super::enhancer::FeatureEnhancer;
use super::explanation::{ExplanationBackend, ExplanationSubject, PerformanceBand};
use super::features::{FeatureDeriver, ModelKind};
use super::metrics::estimate_lca_metrics;
use super::oracle::{invoke, OracleError, OracleSet};
use super::profile::{CircularityReadout, MaterialProfile};
use super::recommendations::recommend;
use super::uncertainty::quantify_predictions;

pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Why a prediction stage used its default.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StageFailure {
    #[error(transparent)]
    Input(#[from] InputConversionError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Runs one material's assessment. Holds shared, read-only handles only.
#[derive(Debug, Clone)]
pub struct AssessmentPipeline {
    profile: &'static MaterialProfile,
    oracles: Arc<OracleSet>,
    explainer: ExplanationBackend,
    enhancer: FeatureEnhancer,
    claims: Option<Arc<dyn ClaimsAnalyzer>>,
    oracle_timeout: Duration,
}

impl AssessmentPipeline {
    pub fn new(material: Material, oracles: Arc<OracleSet>) -> Self {
        Self {
            profile: MaterialProfile::for_material(material),
            oracles,
            explainer: ExplanationBackend::default(),
            enhancer: FeatureEnhancer::default(),
            claims: None,
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }

    pub fn with_explainer(mut self, explainer: ExplanationBackend) -> Self {
        self.explainer = explainer;
        self
    }

    pub fn with_enhancer(mut self, enhancer: FeatureEnhancer) -> Self {
        self.enhancer = enhancer;
        self
    }

    pub fn with_claims_analyzer(mut self, analyzer: Arc<dyn ClaimsAnalyzer>) -> Self {
        self.claims = Some(analyzer);
        self
    }

    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    pub async fn assess(&self, input: &AssessmentInput) -> AssessmentResult {
        self.assess_at(input, Utc::now()).await
    }

    /// Same as [`assess`](Self::assess) with a caller-supplied timestamp.
    pub async fn assess_at(
        &self,
        input: &AssessmentInput,
        timestamp: DateTime<Utc>,
    ) -> AssessmentResult {
        let profile = self.profile;
        let deriver = FeatureDeriver::new(profile, &self.oracles.encoder);

        let environmental = self.environmental(&deriver, input).await;
        let environmental_efficiency = *environmental.value();
        let circularity = self
            .circularity(&deriver, input, environmental_efficiency)
            .await;
        let classification = self.classification(&deriver, input).await;
        let using_ml_models =
            environmental.is_live() || circularity.is_live() || classification.is_live();

        let (environmental_efficiency, environmental_provenance) = environmental.into_parts();
        let (circularity_metrics, circularity_provenance) = circularity.into_parts();
        let (process_classification, classification_provenance) = classification.into_parts();

        let predictions = PredictionSet {
            environmental_efficiency,
            circularity_metrics,
            process_classification: Some(process_classification),
        };

        let (lca_metrics, lca_provenance) =
            estimate_lca_metrics(input, &predictions, profile).into_parts();
        let uncertainty = quantify_predictions(input, &predictions);
        let recommendations = recommend(input, &predictions, &lca_metrics, profile);

        let subject = ExplanationSubject {
            material: profile.material,
            input,
            predictions: &predictions,
        };
        let (explanations, explanation_backend) =
            self.explainer.explain(&subject, self.oracle_timeout).await;

        let evaluation = evaluate(profile.material, &predictions, using_ml_models);
        let enhanced_features = self.enhancer.enhance(input);
        let claims = self.analyze_claims(input);

        AssessmentResult {
            success: true,
            material_type: profile.material,
            using_ml_models,
            model_version: self.oracles.version.clone(),
            data_quality: profile.data_quality.to_string(),
            predictions,
            lca_metrics,
            evaluation,
            uncertainty,
            explanations,
            explanation_backend: explanation_backend.as_str().to_string(),
            recommendations,
            provenance: PredictionProvenance {
                environmental_efficiency: environmental_provenance,
                circularity_metrics: circularity_provenance,
                process_classification: Some(classification_provenance),
                lca_metrics: lca_provenance,
            },
            enhanced_features,
            claims,
            timestamp,
        }
    }

    async fn predict(
        &self,
        deriver: &FeatureDeriver<'_>,
        input: &AssessmentInput,
        kind: ModelKind,
    ) -> Result<Vec<f64>, StageFailure> {
        let oracle = self
            .oracles
            .get(kind)
            .ok_or(OracleError::Unavailable(kind))?;
        let features = deriver.derive(input, kind)?;
        Ok(invoke(oracle, features, self.oracle_timeout).await?)
    }

    async fn environmental(
        &self,
        deriver: &FeatureDeriver<'_>,
        input: &AssessmentInput,
    ) -> StageOutcome<f64> {
        let result = self
            .predict(deriver, input, ModelKind::Environmental)
            .await
            .map(|output| unit(output[0]));
        self.settle(
            ModelKind::Environmental,
            result,
            self.profile.default_environmental_efficiency,
        )
    }

    async fn circularity(
        &self,
        deriver: &FeatureDeriver<'_>,
        input: &AssessmentInput,
        environmental_efficiency: f64,
    ) -> StageOutcome<CircularityMetrics> {
        let result = self
            .predict(deriver, input, ModelKind::Circularity)
            .await
            .and_then(|output| {
                read_circularity(
                    self.profile.circularity_readout,
                    &output,
                    input,
                    environmental_efficiency,
                )
            });
        self.settle(
            ModelKind::Circularity,
            result,
            self.profile.default_circularity,
        )
    }

    async fn classification(
        &self,
        deriver: &FeatureDeriver<'_>,
        input: &AssessmentInput,
    ) -> StageOutcome<ProcessClassification> {
        let defaults = self.profile.classification;
        let result = self
            .predict(deriver, input, ModelKind::Classification)
            .await
            .map(|output| {
                let class_id = output[0].round().max(0.0) as u32;
                let class_name = self
                    .oracles
                    .get(ModelKind::Classification)
                    .and_then(|oracle| oracle.decode(class_id).ok())
                    .unwrap_or_else(|| format!("Process_Type_{class_id}"));
                ProcessClassification {
                    class_name,
                    class_id,
                    confidence: defaults.live_confidence,
                }
            });
        self.settle(
            ModelKind::Classification,
            result,
            ProcessClassification {
                class_name: defaults.class_name.to_string(),
                class_id: defaults.class_id,
                confidence: defaults.confidence,
            },
        )
    }

    fn settle<T>(
        &self,
        kind: ModelKind,
        result: Result<T, StageFailure>,
        default: T,
    ) -> StageOutcome<T> {
        match result {
            Ok(value) => StageOutcome::Live(value),
            Err(err) => {
                let material = self.profile.material;
                if matches!(err, StageFailure::Oracle(OracleError::Unavailable(_))) {
                    debug!(%material, %kind, "oracle absent; using default prediction");
                } else {
                    warn!(%material, %kind, error = %err, "prediction degraded to default");
                }
                StageOutcome::defaulted(default, err)
            }
        }
    }

    fn analyze_claims(&self, input: &AssessmentInput) -> Option<ClaimVerdict> {
        let analyzer = self.claims.as_ref()?;
        let description = input.process_description()?;
        match analyzer.analyze(description) {
            Ok(verdict) => Some(verdict),
            Err(err) => {
                debug!(error = %err, "claims analysis skipped");
                None
            }
        }
    }
}

fn unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

fn read_circularity(
    readout: CircularityReadout,
    output: &[f64],
    input: &AssessmentInput,
    environmental_efficiency: f64,
) -> Result<CircularityMetrics, StageFailure> {
    match readout {
        CircularityReadout::MultiOutput {
            index,
            recycling,
            waste,
        } => {
            let needed = index.max(recycling).max(waste) + 1;
            if output.len() < needed {
                return Err(OracleError::Inference(format!(
                    "circularity oracle returned {} outputs, expected {needed}",
                    output.len()
                ))
                .into());
            }
            Ok(CircularityMetrics {
                circularity_index: unit(output[index]),
                recycling_rate: unit(output[recycling]),
                waste_ratio: unit(output[waste]),
                material_efficiency: environmental_efficiency,
            })
        }
        CircularityReadout::IndexFirst {
            fallback_waste_ratio,
        } => {
            let recycling_rate = unit(input.fraction(InputField::RecyclingRate)?);
            let waste_ratio = if recycling_rate > 0.0 {
                1.0 - recycling_rate
            } else {
                fallback_waste_ratio
            };
            Ok(CircularityMetrics {
                circularity_index: unit(output[0]),
                recycling_rate,
                waste_ratio,
                material_efficiency: environmental_efficiency,
            })
        }
    }
}

/// Headline scores and banded feedback.
pub fn evaluate(material: Material, predictions: &PredictionSet, live: bool) -> Evaluation {
    let environmental_score = predictions.environmental_efficiency;
    let circularity_score = predictions.circularity_metrics.circularity_index;
    let overall_score = (environmental_score + circularity_score) / 2.0;

    let band = match PerformanceBand::from_score(overall_score) {
        PerformanceBand::Excellent => "excellent",
        PerformanceBand::Good => "good",
        PerformanceBand::NeedsImprovement => "moderate",
    };
    let evaluation_method = if live {
        format!("{material}_ml_models")
    } else {
        format!("{material}_baseline_defaults")
    };

    Evaluation {
        overall_score,
        environmental_score,
        circularity_score,
        evaluation_method,
        feedback: format!(
            "{} recycling assessment shows {band} sustainability performance with industry-validated predictions.",
            material.title()
        ),
    }
}
