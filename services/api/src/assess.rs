use clap::Args;
use ecolca::assessment::{AssessmentRequest, AssessmentService, HealthReport};
use ecolca::config::AppConfig;
use ecolca::error::AppError;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// JSON file holding either a full request envelope or bare assessment data
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Material to assess (aluminum or copper). Overrides the envelope.
    #[arg(long)]
    pub(crate) material: Option<String>,
    /// Override the configured model artifact directory
    #[arg(long)]
    pub(crate) model_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ModelsArgs {
    /// Override the configured model artifact directory
    #[arg(long)]
    pub(crate) model_dir: Option<PathBuf>,
}

pub(crate) async fn run_assessment(args: AssessArgs) -> Result<(), AppError> {
    let AssessArgs {
        input,
        material,
        model_dir,
    } = args;

    let service = load_service(model_dir)?;
    let document: Value = serde_json::from_slice(&fs::read(&input)?)?;
    let envelope = into_envelope(document, material.as_deref());
    let request = AssessmentRequest::from_envelope(envelope, service.default_material())?;

    let result = service.submit(request).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub(crate) fn run_model_report(args: ModelsArgs) -> Result<(), AppError> {
    let service = load_service(args.model_dir)?;
    print!("{}", render_model_report(&service.status()));
    Ok(())
}

fn load_service(model_dir: Option<PathBuf>) -> Result<AssessmentService, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(dir) = model_dir {
        config.assessment.model_dir = dir;
    }
    Ok(AssessmentService::from_config(&config.assessment))
}

/// Wraps bare assessment data in an envelope and applies the material override.
fn into_envelope(document: Value, material: Option<&str>) -> Value {
    let mut envelope = match document {
        Value::Object(map) if map.contains_key("assessment_data") => Value::Object(map),
        other => json!({ "assessment_data": other }),
    };
    if let (Some(material), Value::Object(map)) = (material, &mut envelope) {
        map.insert("material".to_string(), Value::String(material.to_string()));
    }
    envelope
}

fn render_model_report(report: &HealthReport) -> String {
    let mut output = format!(
        "default material: {}\n{:<10} {:<17} {:>6} {:>6} {:>6} {:>8}\n",
        report.default_material.as_str(),
        "material",
        "timestamp",
        "env",
        "circ",
        "class",
        "ml_ready"
    );
    for (material, health) in &report.materials {
        output.push_str(&format!(
            "{:<10} {:<17} {:>6} {:>6} {:>6} {:>8}\n",
            material.as_str(),
            health.model_timestamp,
            mark(health.model_status.environmental_model),
            mark(health.model_status.circularity_model),
            mark(health.model_status.classification_model),
            mark(health.ml_ready),
        ));
    }
    output
}

fn mark(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecolca::assessment::{AssessmentSettings, Material, ModelRegistry, OracleCatalog};
    use std::sync::Arc;

    #[test]
    fn bare_data_is_wrapped() {
        let envelope = into_envelope(json!({ "scrapRatio": 60 }), Some("copper"));
        assert_eq!(envelope["assessment_data"]["scrapRatio"], json!(60));
        assert_eq!(envelope["material"], "copper");
    }

    #[test]
    fn existing_envelope_keeps_material_without_override() {
        let envelope = into_envelope(
            json!({ "assessment_data": {}, "material": "aluminum" }),
            None,
        );
        assert_eq!(envelope["material"], "aluminum");
        assert!(envelope["assessment_data"].is_object());
    }

    #[tokio::test]
    async fn wrapped_file_contents_assess_end_to_end() {
        let service = AssessmentService::new(
            Arc::new(ModelRegistry::fixed(OracleCatalog::new())),
            AssessmentSettings::default(),
        );
        let envelope = into_envelope(json!({ "recyclingRate": 70 }), Some("copper"));
        let request = AssessmentRequest::from_envelope(envelope, service.default_material())
            .expect("valid envelope");
        assert_eq!(request.material, Material::Copper);

        let result = service.submit(request).await;
        assert!(!result.using_ml_models);
        assert_eq!(result.evaluation.evaluation_method, "copper_baseline_defaults");
    }

    #[test]
    fn model_report_lists_every_material() {
        let service = AssessmentService::new(
            Arc::new(ModelRegistry::fixed(OracleCatalog::new())),
            AssessmentSettings::default(),
        );
        let rendered = render_model_report(&service.status());
        assert!(rendered.starts_with("default material: aluminum"));
        assert!(rendered.contains("\naluminum "));
        assert!(rendered.contains("\ncopper "));
    }
}
