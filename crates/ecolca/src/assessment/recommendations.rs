use super::domain::{
    AssessmentInput, InputField, LcaMetrics, PredictionSet, Recommendation, RecommendationKind,
};
use super::profile::MaterialProfile;

/// Applies the profile's rules in a fixed order; emits a best-practice note when none fire.
pub fn recommend(
    input: &AssessmentInput,
    predictions: &PredictionSet,
    metrics: &LcaMetrics,
    profile: &MaterialProfile,
) -> Vec<Recommendation> {
    let material = profile.material;
    let thresholds = &profile.thresholds;
    let mut recommendations = Vec::new();

    if predictions.environmental_efficiency < thresholds.min_environmental_efficiency {
        recommendations.push(Recommendation {
            category: RecommendationKind::EnergyTransition,
            message: format!(
                "Consider transitioning to renewable energy sources to improve {material} recycling efficiency"
            ),
        });
    }

    if predictions.circularity_metrics.recycling_rate < thresholds.min_recycling_rate {
        recommendations.push(Recommendation {
            category: RecommendationKind::RecycledContent,
            message: format!(
                "Increase recycled {material} content to achieve higher circularity performance"
            ),
        });
    }

    // Intensity rules only make sense against a positive tonnage.
    if let Some(scale) = production_scale(input) {
        if metrics.carbon_footprint / scale > thresholds.max_carbon_intensity {
            recommendations.push(Recommendation {
                category: RecommendationKind::ProcessOptimization,
                message: profile.copy.process_optimization.to_string(),
            });
        }
        if metrics.water_usage / scale > thresholds.max_water_intensity {
            recommendations.push(Recommendation {
                category: RecommendationKind::WaterRecycling,
                message: profile.copy.water_recycling.to_string(),
            });
        }
    }

    if recommendations.is_empty() {
        recommendations.push(Recommendation {
            category: RecommendationKind::BestPractice,
            message: format!(
                "Excellent {material} recycling performance! Your process meets industry best practices"
            ),
        });
    }

    recommendations
}

fn production_scale(input: &AssessmentInput) -> Option<f64> {
    input
        .number(InputField::ProductionScale)
        .ok()
        .filter(|scale| *scale > 0.0)
}
