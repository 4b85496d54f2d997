use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use super::common::*;
use approx::assert_relative_eq;
use serde_json::json;

use crate::assessment::domain::Material;
use crate::assessment::features::ModelKind;
use crate::assessment::oracle::{
    load_oracle_set, ArtifactError, ArtifactLocator, ModelRegistry, OracleCatalog,
};
use crate::assessment::pipeline::AssessmentPipeline;
use crate::assessment::service::{AssessmentService, AssessmentSettings};

const STAMP: &str = "20250919_005442";

fn write_aluminum_artifacts(root: &std::path::Path) {
    let locator = ArtifactLocator::new(root, Material::Aluminum, STAMP);
    write_json(
        &locator.model_path(ModelKind::Environmental),
        &linear_model(12, &[0.88], "identity"),
    );
    write_json(
        &locator.model_path(ModelKind::Circularity),
        &linear_model(6, &[0.6, 0.91, 0.04], "identity"),
    );
    write_json(
        &locator.model_path(ModelKind::Classification),
        &linear_model(12, &[0.1, 0.9, 0.2], "argmax"),
    );
    write_json(
        &locator.encoder_path("classification"),
        &json!({ "classes": ["primary_smelting", "secondary_remelting", "dross_recovery"] }),
    );
}

#[test]
fn locator_follows_artifact_naming() {
    let locator = ArtifactLocator::new("models", Material::Copper, "20250919_025639");
    assert_eq!(
        locator.model_path(ModelKind::Circularity),
        std::path::Path::new("models/copper/circularity_model_20250919_025639.json")
    );
    assert_eq!(
        locator.encoder_path("energy"),
        std::path::Path::new("models/copper/energy_encoder_20250919_025639.json")
    );
}

#[test]
fn missing_directory_yields_empty_set() {
    let locator = ArtifactLocator::new(scratch_dir("empty"), Material::Copper, STAMP);
    let set = load_oracle_set(&locator);
    let status = set.status();

    assert!(!status.any_loaded());
    assert!(!status.ml_ready());
    assert_eq!(set.version, STAMP);
}

#[test]
fn loads_models_and_encoders_from_disk() {
    let root = scratch_dir("load");
    write_aluminum_artifacts(&root);
    let locator = ArtifactLocator::new(&root, Material::Aluminum, STAMP);
    write_json(
        &locator.encoder_path("energy"),
        &json!({ "classes": ["coal", "gas", "grid", "renewable"] }),
    );

    let set = load_oracle_set(&locator);
    let status = set.status();
    assert!(status.ml_ready());
    assert!(status.energy_encoder);
    assert!(!status.location_encoder);

    let classifier = set
        .get(ModelKind::Classification)
        .expect("classifier loaded");
    assert_eq!(
        classifier.decode(1).expect("decodes"),
        "secondary_remelting"
    );
}

#[test]
fn broken_artifacts_are_skipped() {
    let root = scratch_dir("broken");
    let locator = ArtifactLocator::new(&root, Material::Aluminum, STAMP);
    write_json(
        &locator.model_path(ModelKind::Environmental),
        &linear_model(3, &[0.5], "identity"),
    );
    let circularity = locator.model_path(ModelKind::Circularity);
    fs::write(&circularity, b"{ not json").expect("written");
    write_json(
        &locator.model_path(ModelKind::Classification),
        &json!({ "n_features": 12, "outputs": [{ "intercept": 0.0, "coefficients": [1.0] }] }),
    );

    let set = load_oracle_set(&locator);
    // width-3 model loads but will fail arity checks at inference time
    assert!(set.environmental.is_some());
    assert!(set.circularity.is_none());
    assert!(set.classification.is_none());
}

#[tokio::test]
async fn loaded_artifacts_drive_the_pipeline() {
    let root = scratch_dir("pipeline");
    write_aluminum_artifacts(&root);
    let set = load_oracle_set(&ArtifactLocator::new(&root, Material::Aluminum, STAMP));

    let result = AssessmentPipeline::new(Material::Aluminum, Arc::new(set))
        .assess_at(&example_input(), fixed_time())
        .await;

    assert!(result.using_ml_models);
    assert_relative_eq!(result.predictions.environmental_efficiency, 0.88);
    assert_relative_eq!(result.predictions.circularity_metrics.circularity_index, 0.91);
    assert_relative_eq!(result.predictions.circularity_metrics.waste_ratio, 0.04);
    let classification = result
        .predictions
        .process_classification
        .expect("classification present");
    assert_eq!(classification.class_name, "secondary_remelting");
}

#[tokio::test]
async fn reload_swaps_in_new_artifacts() {
    let root = scratch_dir("reload");
    let timestamps = BTreeMap::from([
        (Material::Aluminum, STAMP.to_string()),
        (Material::Copper, "20250919_025639".to_string()),
    ]);
    let registry = Arc::new(ModelRegistry::from_directory(&root, timestamps));
    let service = AssessmentService::new(Arc::clone(&registry), AssessmentSettings::default());

    let before = registry.snapshot();
    assert!(!service.status().models_loaded);

    write_aluminum_artifacts(&root);
    let report = service.reload().await.expect("reload succeeds");

    assert!(report.models_loaded);
    assert!(report.ml_ready);
    assert!(!report.materials[&Material::Copper].models_loaded);
    // readers holding the old snapshot are unaffected
    assert!(!before.get(Material::Aluminum).status().any_loaded());
    assert!(registry.snapshot().get(Material::Aluminum).status().ml_ready());
}

#[test]
fn fixed_registry_refuses_reload() {
    let registry = ModelRegistry::fixed(OracleCatalog::new());
    assert!(matches!(registry.reload(), Err(ArtifactError::Detached)));
}
