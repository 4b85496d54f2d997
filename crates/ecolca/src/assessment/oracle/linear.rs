use serde::{Deserialize, Serialize};

use super::{ArtifactError, ModelOracle, OracleError};
use crate::assessment::encoder::LabelEncoder;
use crate::assessment::features::{FeatureVector, ModelKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Identity,
    Logistic,
    /// Classifier: one head per class, the winning index is the output.
    Argmax,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearHead {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

/// Exported linear model: one head per output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModelArtifact {
    pub n_features: usize,
    pub outputs: Vec<LinearHead>,
    #[serde(default)]
    pub activation: Activation,
}

#[derive(Debug, Clone)]
pub struct LinearOracle {
    kind: ModelKind,
    artifact: LinearModelArtifact,
    labels: Option<LabelEncoder>,
}

impl LinearOracle {
    pub fn new(kind: ModelKind, artifact: LinearModelArtifact) -> Result<Self, ArtifactError> {
        if artifact.outputs.is_empty() {
            return Err(ArtifactError::Shape("model declares no outputs".to_string()));
        }
        if let Some(head) = artifact
            .outputs
            .iter()
            .find(|head| head.coefficients.len() != artifact.n_features)
        {
            return Err(ArtifactError::Shape(format!(
                "head has {} coefficients, expected {}",
                head.coefficients.len(),
                artifact.n_features
            )));
        }
        Ok(Self {
            kind,
            artifact,
            labels: None,
        })
    }

    pub fn with_labels(mut self, labels: LabelEncoder) -> Self {
        self.labels = Some(labels);
        self
    }

    fn raw_scores(&self, values: &[f64]) -> Vec<f64> {
        self.artifact
            .outputs
            .iter()
            .map(|head| {
                head.intercept
                    + head
                        .coefficients
                        .iter()
                        .zip(values)
                        .map(|(weight, value)| weight * value)
                        .sum::<f64>()
            })
            .collect()
    }
}

impl ModelOracle for LinearOracle {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn expected_arity(&self) -> usize {
        self.artifact.n_features
    }

    fn predict(&self, features: &FeatureVector) -> Result<Vec<f64>, OracleError> {
        if features.len() != self.artifact.n_features {
            return Err(OracleError::ArityMismatch {
                expected: self.artifact.n_features,
                actual: features.len(),
            });
        }

        let scores = self.raw_scores(features.values());
        let output = match self.artifact.activation {
            Activation::Identity => scores,
            Activation::Logistic => scores
                .into_iter()
                .map(|score| 1.0 / (1.0 + (-score).exp()))
                .collect(),
            Activation::Argmax => {
                let winner = scores
                    .iter()
                    .enumerate()
                    .filter(|(_, score)| score.is_finite())
                    .max_by(|(_, left), (_, right)| left.total_cmp(right))
                    .map(|(index, _)| index)
                    .ok_or_else(|| OracleError::Inference("no finite class score".to_string()))?;
                vec![winner as f64]
            }
        };
        Ok(output)
    }

    fn decode(&self, label_id: u32) -> Result<String, OracleError> {
        self.labels
            .as_ref()
            .and_then(|labels| labels.inverse_transform(label_id))
            .map(str::to_string)
            .ok_or(OracleError::UnknownLabel(label_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn artifact(activation: Activation, heads: Vec<(f64, Vec<f64>)>) -> LinearModelArtifact {
        LinearModelArtifact {
            n_features: heads[0].1.len(),
            outputs: heads
                .into_iter()
                .map(|(intercept, coefficients)| LinearHead {
                    intercept,
                    coefficients,
                })
                .collect(),
            activation,
        }
    }

    #[test]
    fn identity_heads_compute_affine_outputs() {
        let oracle = LinearOracle::new(
            ModelKind::Circularity,
            artifact(
                Activation::Identity,
                vec![(0.1, vec![0.5, 0.0]), (0.2, vec![0.0, 0.25])],
            ),
        )
        .expect("valid artifact");

        let output = oracle
            .predict(&FeatureVector::new(ModelKind::Circularity, vec![1.0, 2.0]))
            .expect("predicts");
        assert_relative_eq!(output[0], 0.6, epsilon = 1e-12);
        assert_relative_eq!(output[1], 0.7, epsilon = 1e-12);
    }

    #[test]
    fn logistic_activation_squashes_into_unit_interval() {
        let oracle = LinearOracle::new(
            ModelKind::Environmental,
            artifact(Activation::Logistic, vec![(0.0, vec![1.0])]),
        )
        .expect("valid artifact");

        let output = oracle
            .predict(&FeatureVector::new(ModelKind::Environmental, vec![0.0]))
            .expect("predicts");
        assert_relative_eq!(output[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn argmax_returns_winning_class_and_decodes_it() {
        let oracle = LinearOracle::new(
            ModelKind::Classification,
            artifact(
                Activation::Argmax,
                vec![(0.0, vec![1.0]), (0.0, vec![-1.0]), (0.5, vec![1.0])],
            ),
        )
        .expect("valid artifact")
        .with_labels(LabelEncoder::new(["primary", "secondary", "hybrid"]));

        let output = oracle
            .predict(&FeatureVector::new(ModelKind::Classification, vec![2.0]))
            .expect("predicts");
        assert_eq!(output, vec![2.0]);
        assert_eq!(oracle.decode(2).expect("decodes"), "hybrid");
        assert_eq!(oracle.decode(9), Err(OracleError::UnknownLabel(9)));
    }

    #[test]
    fn rejects_heads_with_wrong_width() {
        let bad = LinearModelArtifact {
            n_features: 3,
            outputs: vec![LinearHead {
                intercept: 0.0,
                coefficients: vec![1.0],
            }],
            activation: Activation::Identity,
        };
        assert!(matches!(
            LinearOracle::new(ModelKind::Environmental, bad),
            Err(ArtifactError::Shape(_))
        ));
    }
}
