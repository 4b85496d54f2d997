//! Narratives for each prediction category.
//!
//! The templated backend is always available. The generative backend asks a
//! [`TextGenerator`] for every narrative and falls back to the templated set as a whole when
//! any request fails, so callers never see a mix of the two.

mod command;

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{AssessmentInput, Explanations, InputField, Material, PredictionSet};

pub use command::CommandTextGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationBackendKind {
    Templated,
    Generative,
}

impl ExplanationBackendKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "templated" | "template" | "rules" => Some(Self::Templated),
            "generative" | "llm" => Some(Self::Generative),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExplanationBackendKind::Templated => "templated",
            ExplanationBackendKind::Generative => "generative",
        }
    }
}

/// Score bands shared by narratives and evaluation feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceBand {
    Excellent,
    Good,
    NeedsImprovement,
}

impl PerformanceBand {
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            PerformanceBand::Excellent
        } else if score > 0.6 {
            PerformanceBand::Good
        } else {
            PerformanceBand::NeedsImprovement
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("failed to start '{program}': {source}")]
    Spawn { program: String, source: io::Error },
    #[error("generator failed: {0}")]
    Failed(String),
    #[error("generator returned an empty narrative")]
    Empty,
    #[error("generator did not answer within {0:?}")]
    Timeout(Duration),
}

pub type Generation<'a> = Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;

/// Produces free text for a prompt.
///
/// Dropping the returned future must abandon the work, so implementations must not block
/// the runtime thread.
pub trait TextGenerator: Send + Sync + fmt::Debug {
    fn generate<'a>(&'a self, prompt: &'a str) -> Generation<'a>;
}

/// What a narrative is written about.
#[derive(Debug, Clone, Copy)]
pub struct ExplanationSubject<'a> {
    pub material: Material,
    pub input: &'a AssessmentInput,
    pub predictions: &'a PredictionSet,
}

impl ExplanationSubject<'_> {
    /// Submitted recycling rate in percent, or the predicted rate when unreadable.
    fn recycling_percent(&self) -> f64 {
        self.input
            .number(InputField::RecyclingRate)
            .unwrap_or_else(|_| self.predictions.circularity_metrics.recycling_rate * 100.0)
    }
}

#[derive(Debug, Clone, Default)]
pub enum ExplanationBackend {
    #[default]
    Templated,
    Generative(Arc<dyn TextGenerator>),
}

impl ExplanationBackend {
    pub fn kind(&self) -> ExplanationBackendKind {
        match self {
            ExplanationBackend::Templated => ExplanationBackendKind::Templated,
            ExplanationBackend::Generative(_) => ExplanationBackendKind::Generative,
        }
    }

    /// Builds the configured backend; a generative setting without a usable command stays templated.
    pub fn from_settings(kind: ExplanationBackendKind, command: Option<&str>) -> Self {
        match kind {
            ExplanationBackendKind::Templated => ExplanationBackend::Templated,
            ExplanationBackendKind::Generative => match command.and_then(CommandTextGenerator::parse) {
                Some(generator) => ExplanationBackend::Generative(Arc::new(generator)),
                None => {
                    warn!("generative explanations requested without a command; using templates");
                    ExplanationBackend::Templated
                }
            },
        }
    }

    /// Returns the narratives and the backend that actually produced them.
    pub async fn explain(
        &self,
        subject: &ExplanationSubject<'_>,
        deadline: Duration,
    ) -> (Explanations, ExplanationBackendKind) {
        let generator = match self {
            ExplanationBackend::Templated => {
                return (templated(subject), ExplanationBackendKind::Templated)
            }
            ExplanationBackend::Generative(generator) => Arc::clone(generator),
        };

        let prompts = prompts(subject);
        match generate_all(generator, prompts, deadline).await {
            Ok(mut texts) => {
                let classification = subject
                    .predictions
                    .process_classification
                    .as_ref()
                    .and_then(|_| texts.pop());
                let circularity = texts.pop();
                let environmental = texts.pop();
                match (environmental, circularity) {
                    (Some(environmental), Some(circularity)) => (
                        Explanations {
                            environmental,
                            circularity,
                            classification,
                        },
                        ExplanationBackendKind::Generative,
                    ),
                    _ => (templated(subject), ExplanationBackendKind::Templated),
                }
            }
            Err(err) => {
                warn!(material = %subject.material, error = %err, "generative explanations failed; using templates");
                (templated(subject), ExplanationBackendKind::Templated)
            }
        }
    }
}

async fn generate_all(
    generator: Arc<dyn TextGenerator>,
    prompts: Vec<String>,
    deadline: Duration,
) -> Result<Vec<String>, GenerationError> {
    let sequence = async {
        let mut texts = Vec::with_capacity(prompts.len());
        for prompt in &prompts {
            texts.push(generator.generate(prompt).await?);
        }
        Ok(texts)
    };
    // expiry drops the in-flight generation and skips the prompts after it
    tokio::time::timeout(deadline, sequence)
        .await
        .map_err(|_| GenerationError::Timeout(deadline))?
}

fn prompts(subject: &ExplanationSubject<'_>) -> Vec<String> {
    let predictions = subject.predictions;
    let material = subject.material;
    let mut prompts = vec![
        format!(
            "In two sentences, explain an environmental efficiency score of {:.2} for a {material} recycling process with a {}% recycling rate powered by {} energy.",
            predictions.environmental_efficiency,
            subject.recycling_percent(),
            subject.input.energy_source().label(),
        ),
        format!(
            "In two sentences, explain a circularity index of {:.2} (waste ratio {:.2}) for a {material} recycling process.",
            predictions.circularity_metrics.circularity_index,
            predictions.circularity_metrics.waste_ratio,
        ),
    ];
    if let Some(classification) = &predictions.process_classification {
        prompts.push(format!(
            "In one sentence, describe a {material} process classified as '{}'.",
            classification.class_name
        ));
    }
    prompts
}

/// Rule-based narratives banded by score.
pub fn templated(subject: &ExplanationSubject<'_>) -> Explanations {
    let predictions = subject.predictions;
    let material = subject.material;
    let efficiency = predictions.environmental_efficiency;

    let environmental = match PerformanceBand::from_score(efficiency) {
        PerformanceBand::Excellent => format!(
            "Excellent environmental efficiency ({efficiency:.2}) achieved through high recycling rate ({}%) and {} energy source. The process demonstrates strong sustainability practices.",
            subject.recycling_percent(),
            subject.input.energy_source().label(),
        ),
        PerformanceBand::Good => format!(
            "Good environmental efficiency ({efficiency:.2}). Consider optimizing energy usage and increasing recycled content to reach excellence."
        ),
        PerformanceBand::NeedsImprovement => format!(
            "Environmental efficiency ({efficiency:.2}) needs improvement. Focus on renewable energy adoption and increasing recycling rates."
        ),
    };

    let index = predictions.circularity_metrics.circularity_index;
    let circularity = match PerformanceBand::from_score(index) {
        PerformanceBand::Excellent => format!(
            "Circularity index of {index:.2} reflects strong circular economy implementation in your {material} process."
        ),
        PerformanceBand::Good => format!(
            "Circularity index of {index:.2} reflects partial circular economy implementation in your {material} process. Raising secondary material use would close more loops."
        ),
        PerformanceBand::NeedsImprovement => format!(
            "Circularity index of {index:.2} indicates limited circular economy implementation in your {material} process. Prioritize scrap recovery and waste reduction."
        ),
    };

    let classification = predictions.process_classification.as_ref().map(|class| {
        format!(
            "Process identified as '{}' based on input characteristics and processing parameters.",
            class.class_name
        )
    });

    Explanations {
        environmental,
        circularity,
        classification,
    }
}
