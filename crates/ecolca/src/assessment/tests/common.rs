use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use crate::assessment::domain::{AssessmentInput, Material};
use crate::assessment::features::{FeatureVector, ModelKind};
use crate::assessment::oracle::{ModelOracle, ModelRegistry, OracleCatalog, OracleError, OracleSet};
use crate::assessment::pipeline::AssessmentPipeline;
use crate::assessment::service::{AssessmentService, AssessmentSettings};

pub(super) fn input(value: Value) -> AssessmentInput {
    serde_json::from_value(value).expect("assessment input parses")
}

pub(super) fn example_json() -> Value {
    json!({
        "scrapRatio": 75,
        "recyclingRate": 85,
        "materialEfficiency": 85,
        "energySource": "renewable",
        "productionScale": 500,
        "totalInputs": 500,
        "totalOutputs": 450,
    })
}

pub(super) fn example_input() -> AssessmentInput {
    input(example_json())
}

pub(super) fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 19, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn offline_pipeline(material: Material) -> AssessmentPipeline {
    AssessmentPipeline::new(material, Arc::new(OracleSet::empty("test")))
}

/// Oracle returning a canned output, optionally after a delay.
#[derive(Debug, Clone)]
pub(super) struct StubOracle {
    kind: ModelKind,
    arity: usize,
    output: Vec<f64>,
    labels: Vec<String>,
    delay: Option<Duration>,
}

impl StubOracle {
    pub(super) fn new(kind: ModelKind, arity: usize, output: Vec<f64>) -> Self {
        Self {
            kind,
            arity,
            output,
            labels: Vec::new(),
            delay: None,
        }
    }

    pub(super) fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|label| label.to_string()).collect();
        self
    }

    pub(super) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(super) fn shared(self) -> Arc<dyn ModelOracle> {
        Arc::new(self)
    }
}

impl ModelOracle for StubOracle {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn expected_arity(&self) -> usize {
        self.arity
    }

    fn predict(&self, _features: &FeatureVector) -> Result<Vec<f64>, OracleError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        Ok(self.output.clone())
    }

    fn decode(&self, label_id: u32) -> Result<String, OracleError> {
        self.labels
            .get(label_id as usize)
            .cloned()
            .ok_or(OracleError::UnknownLabel(label_id))
    }
}

pub(super) fn live_aluminum_set() -> OracleSet {
    let mut set = OracleSet::empty("20250919_005442")
        .with_oracle(StubOracle::new(ModelKind::Environmental, 12, vec![0.92]).shared())
        .with_oracle(StubOracle::new(ModelKind::Circularity, 6, vec![0.5, 0.9, 0.05]).shared())
        .with_oracle(
            StubOracle::new(ModelKind::Classification, 12, vec![2.2])
                .with_labels(&["primary", "secondary", "closed_loop"])
                .shared(),
        );
    set.classification_decoder = true;
    set
}

pub(super) fn offline_service() -> Arc<AssessmentService> {
    Arc::new(AssessmentService::new(
        Arc::new(ModelRegistry::fixed(OracleCatalog::new())),
        AssessmentSettings::default(),
    ))
}

pub(super) fn live_service() -> Arc<AssessmentService> {
    let catalog = OracleCatalog::new().with_set(Material::Aluminum, live_aluminum_set());
    Arc::new(AssessmentService::new(
        Arc::new(ModelRegistry::fixed(catalog)),
        AssessmentSettings::default(),
    ))
}

/// Fresh scratch directory under the system temp dir.
pub(super) fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ecolca-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("scratch dir created");
    dir
}

pub(super) fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("artifact dir created");
    }
    fs::write(path, serde_json::to_vec_pretty(value).expect("serializes")).expect("artifact written");
}

pub(super) fn linear_model(n_features: usize, intercepts: &[f64], activation: &str) -> Value {
    let outputs: Vec<Value> = intercepts
        .iter()
        .map(|intercept| {
            json!({
                "intercept": intercept,
                "coefficients": vec![0.0; n_features],
            })
        })
        .collect();
    json!({
        "n_features": n_features,
        "outputs": outputs,
        "activation": activation,
    })
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse json body")
}
