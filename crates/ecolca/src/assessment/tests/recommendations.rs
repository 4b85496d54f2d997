use super::common::*;
use serde_json::json;

use crate::assessment::domain::{LcaMetrics, PredictionSet, RecommendationKind};
use crate::assessment::profile::{MaterialProfile, ALUMINUM, COPPER};
use crate::assessment::recommendations::recommend;

fn predictions(efficiency: f64, recycling: f64, profile: &MaterialProfile) -> PredictionSet {
    let mut circularity = profile.default_circularity;
    circularity.recycling_rate = recycling;
    PredictionSet {
        environmental_efficiency: efficiency,
        circularity_metrics: circularity,
        process_classification: None,
    }
}

fn metrics(carbon: f64, water: f64) -> LcaMetrics {
    LcaMetrics {
        carbon_footprint: carbon,
        energy_consumption: 0.0,
        water_usage: water,
    }
}

fn kinds(items: &[crate::assessment::domain::Recommendation]) -> Vec<RecommendationKind> {
    items.iter().map(|item| item.category).collect()
}

#[test]
fn healthy_process_gets_single_best_practice_note() {
    let items = recommend(
        &example_input(),
        &predictions(0.9, 0.9, &ALUMINUM),
        &metrics(66.25, 1500.0),
        &ALUMINUM,
    );
    assert_eq!(kinds(&items), vec![RecommendationKind::BestPractice]);
    assert_eq!(
        items[0].message,
        "Excellent aluminum recycling performance! Your process meets industry best practices"
    );
}

#[test]
fn every_rule_fires_in_fixed_order() {
    let items = recommend(
        &input(json!({ "productionScale": 100 })),
        &predictions(0.5, 0.5, &COPPER),
        &metrics(250.0, 7000.0),
        &COPPER,
    );
    assert_eq!(
        kinds(&items),
        vec![
            RecommendationKind::EnergyTransition,
            RecommendationKind::RecycledContent,
            RecommendationKind::ProcessOptimization,
            RecommendationKind::WaterRecycling,
        ]
    );
    assert_eq!(
        items[0].message,
        "Consider transitioning to renewable energy sources to improve copper recycling efficiency"
    );
    assert_eq!(items[2].message, COPPER.copy.process_optimization);
}

#[test]
fn thresholds_differ_per_material() {
    // 0.78 recycling is fine for copper but below the aluminum bar
    let aluminum = recommend(
        &example_input(),
        &predictions(0.9, 0.78, &ALUMINUM),
        &metrics(10.0, 10.0),
        &ALUMINUM,
    );
    let copper = recommend(
        &example_input(),
        &predictions(0.9, 0.78, &COPPER),
        &metrics(10.0, 10.0),
        &COPPER,
    );
    assert_eq!(kinds(&aluminum), vec![RecommendationKind::RecycledContent]);
    assert_eq!(kinds(&copper), vec![RecommendationKind::BestPractice]);
}

#[test]
fn intensity_rules_skip_non_positive_or_unreadable_scale() {
    for scale in [json!(0), json!(-50), json!("unknown")] {
        let items = recommend(
            &input(json!({ "productionScale": scale })),
            &predictions(0.9, 0.9, &ALUMINUM),
            &metrics(1e6, 1e6),
            &ALUMINUM,
        );
        assert_eq!(kinds(&items), vec![RecommendationKind::BestPractice]);
    }
}
