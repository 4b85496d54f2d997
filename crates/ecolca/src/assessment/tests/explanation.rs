use std::sync::Arc;
use std::time::Duration;

use super::common::*;
use serde_json::json;

use crate::assessment::domain::{Material, PredictionSet, ProcessClassification};
use crate::assessment::explanation::{
    templated, CommandTextGenerator, ExplanationBackend, ExplanationBackendKind,
    ExplanationSubject, Generation, GenerationError, PerformanceBand, TextGenerator,
};
use crate::assessment::profile::ALUMINUM;

#[derive(Debug)]
struct EchoGenerator;

impl TextGenerator for EchoGenerator {
    fn generate<'a>(&'a self, prompt: &'a str) -> Generation<'a> {
        Box::pin(async move { Ok(format!("generated: {prompt}")) })
    }
}

/// Succeeds once, then fails.
#[derive(Debug, Default)]
struct FlakyGenerator {
    calls: std::sync::atomic::AtomicUsize,
}

impl TextGenerator for FlakyGenerator {
    fn generate<'a>(&'a self, prompt: &'a str) -> Generation<'a> {
        let call = self
            .calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Box::pin(async move {
            if call == 0 {
                Ok(prompt.to_string())
            } else {
                Err(GenerationError::Empty)
            }
        })
    }
}

/// Counts the prompts it was asked for and never answers in time.
#[derive(Debug, Default)]
struct SlowGenerator {
    started: std::sync::atomic::AtomicUsize,
}

impl TextGenerator for SlowGenerator {
    fn generate<'a>(&'a self, prompt: &'a str) -> Generation<'a> {
        self.started
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(prompt.to_string())
        })
    }
}

fn predictions(efficiency: f64, index: f64) -> PredictionSet {
    let mut circularity = ALUMINUM.default_circularity;
    circularity.circularity_index = index;
    PredictionSet {
        environmental_efficiency: efficiency,
        circularity_metrics: circularity,
        process_classification: Some(ProcessClassification {
            class_name: "Secondary Aluminum Recycling".to_string(),
            class_id: 1,
            confidence: 0.7,
        }),
    }
}

#[test]
fn bands_split_at_documented_thresholds() {
    assert_eq!(PerformanceBand::from_score(0.81), PerformanceBand::Excellent);
    assert_eq!(PerformanceBand::from_score(0.8), PerformanceBand::Good);
    assert_eq!(PerformanceBand::from_score(0.61), PerformanceBand::Good);
    assert_eq!(
        PerformanceBand::from_score(0.6),
        PerformanceBand::NeedsImprovement
    );
}

#[test]
fn backend_kind_parses_aliases() {
    assert_eq!(
        ExplanationBackendKind::parse(" LLM "),
        Some(ExplanationBackendKind::Generative)
    );
    assert_eq!(
        ExplanationBackendKind::parse("templated"),
        Some(ExplanationBackendKind::Templated)
    );
    assert_eq!(ExplanationBackendKind::parse("oracle"), None);
}

#[test]
fn templated_narratives_interpolate_values() {
    let submission = example_input();
    let predictions = predictions(0.92, 0.55);
    let explanations = templated(&ExplanationSubject {
        material: Material::Aluminum,
        input: &submission,
        predictions: &predictions,
    });

    assert_eq!(
        explanations.environmental,
        "Excellent environmental efficiency (0.92) achieved through high recycling rate (85%) and renewable energy source. The process demonstrates strong sustainability practices."
    );
    assert!(explanations.circularity.starts_with("Circularity index of 0.55 indicates limited"));
    assert!(explanations.circularity.contains("aluminum process"));
    assert_eq!(
        explanations.classification.as_deref(),
        Some("Process identified as 'Secondary Aluminum Recycling' based on input characteristics and processing parameters.")
    );
}

#[test]
fn classification_narrative_absent_without_classification() {
    let submission = input(json!({}));
    let mut predictions = predictions(0.65, 0.7);
    predictions.process_classification = None;
    let explanations = templated(&ExplanationSubject {
        material: Material::Copper,
        input: &submission,
        predictions: &predictions,
    });
    assert!(explanations.environmental.starts_with("Good environmental efficiency (0.65)"));
    assert!(explanations.classification.is_none());
}

#[tokio::test]
async fn generative_backend_fills_every_category() {
    let submission = example_input();
    let predictions = predictions(0.7, 0.9);
    let subject = ExplanationSubject {
        material: Material::Aluminum,
        input: &submission,
        predictions: &predictions,
    };

    let backend = ExplanationBackend::Generative(Arc::new(EchoGenerator));
    let (explanations, used) = backend.explain(&subject, Duration::from_secs(1)).await;

    assert_eq!(used, ExplanationBackendKind::Generative);
    assert!(explanations.environmental.starts_with("generated: "));
    assert!(explanations.environmental.contains("0.70"));
    assert!(explanations.circularity.contains("0.90"));
    assert!(explanations
        .classification
        .as_deref()
        .is_some_and(|text| text.contains("Secondary Aluminum Recycling")));
}

#[tokio::test]
async fn partial_generation_falls_back_to_templates_wholesale() {
    let submission = example_input();
    let predictions = predictions(0.7, 0.9);
    let subject = ExplanationSubject {
        material: Material::Aluminum,
        input: &submission,
        predictions: &predictions,
    };

    let backend = ExplanationBackend::Generative(Arc::new(FlakyGenerator::default()));
    let (explanations, used) = backend.explain(&subject, Duration::from_secs(1)).await;

    assert_eq!(used, ExplanationBackendKind::Templated);
    assert_eq!(explanations, templated(&subject));
}

#[tokio::test]
async fn slow_generation_falls_back_to_templates() {
    let submission = example_input();
    let predictions = predictions(0.7, 0.9);
    let subject = ExplanationSubject {
        material: Material::Aluminum,
        input: &submission,
        predictions: &predictions,
    };

    let generator = Arc::new(SlowGenerator::default());
    let backend = ExplanationBackend::Generative(generator.clone());
    let (explanations, used) = backend.explain(&subject, Duration::from_millis(20)).await;

    assert_eq!(used, ExplanationBackendKind::Templated);
    assert_eq!(explanations, templated(&subject));

    // prompts after the expired one are never issued
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        generator.started.load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}

#[cfg(unix)]
#[tokio::test]
async fn expired_narrator_process_is_killed() {
    let dir = scratch_dir("narrator");
    let started = dir.join("started.log");
    let finished = dir.join("finished");
    let script = dir.join("narrate.sh");
    std::fs::write(
        &script,
        format!(
            "echo started >> {}\nsleep 2\ntouch {}\necho narrative\n",
            started.display(),
            finished.display()
        ),
    )
    .expect("script written");

    let submission = example_input();
    let predictions = predictions(0.7, 0.9);
    let subject = ExplanationSubject {
        material: Material::Aluminum,
        input: &submission,
        predictions: &predictions,
    };
    let generator = CommandTextGenerator::parse(&format!("sh {}", script.display()))
        .expect("parses");
    let backend = ExplanationBackend::Generative(Arc::new(generator));

    let begun = std::time::Instant::now();
    let (explanations, used) = backend.explain(&subject, Duration::from_millis(100)).await;
    assert!(begun.elapsed() < Duration::from_secs(1));
    assert_eq!(used, ExplanationBackendKind::Templated);
    assert_eq!(explanations, templated(&subject));

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(!finished.exists());
    let log = std::fs::read_to_string(&started).unwrap_or_default();
    assert!(log.lines().count() <= 1);
}

#[test]
fn generative_setting_without_command_stays_templated() {
    let backend = ExplanationBackend::from_settings(ExplanationBackendKind::Generative, Some("  "));
    assert_eq!(backend.kind(), ExplanationBackendKind::Templated);

    let backend =
        ExplanationBackend::from_settings(ExplanationBackendKind::Generative, Some("narrate"));
    assert_eq!(backend.kind(), ExplanationBackendKind::Generative);
}
