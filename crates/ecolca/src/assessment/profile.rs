use super::domain::{CircularityMetrics, EnergySource, InputField, LcaMetrics, Material};
use super::features::FeatureColumn;

/// Constant keyed by energy-source tier; coal, gas and unknown sources share the fossil tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BySource {
    pub renewable: f64,
    pub grid: f64,
    pub fossil: f64,
}

impl BySource {
    pub fn get(&self, source: &EnergySource) -> f64 {
        match source {
            EnergySource::Renewable => self.renewable,
            EnergySource::Grid => self.grid,
            _ => self.fossil,
        }
    }
}

/// Thresholds driving the recommendation rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationThresholds {
    pub min_environmental_efficiency: f64,
    pub min_recycling_rate: f64,
    /// Tonnes CO2 per tonne processed.
    pub max_carbon_intensity: f64,
    /// Cubic metres per tonne processed.
    pub max_water_intensity: f64,
}

/// How the circularity oracle's raw outputs map onto circularity metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircularityReadout {
    /// Multi-output regressor; index and recycling rate share a column.
    MultiOutput {
        index: usize,
        recycling: usize,
        waste: usize,
    },
    /// First output is the index; recycling and waste come from the submission.
    IndexFirst { fallback_waste_ratio: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationDefaults {
    pub class_name: &'static str,
    pub class_id: u32,
    pub confidence: f64,
    pub live_confidence: f64,
}

/// Material-specific wording for the process rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationCopy {
    pub process_optimization: &'static str,
    pub water_recycling: &'static str,
}

/// Immutable per-material constants parameterizing the whole pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialProfile {
    pub material: Material,
    /// Provenance label of the constants, echoed as `data_quality`.
    pub data_quality: &'static str,
    /// GJ per tonne at full efficiency.
    pub base_energy: BySource,
    /// K in `base × (K − efficiency)`; must exceed 1.
    pub efficiency_amplifier: f64,
    /// Tonnes CO2 per GJ.
    pub emission_factor: BySource,
    /// Tonnes CO2 per tonne from melting, refining and transport.
    pub process_emission: f64,
    pub water_base: f64,
    pub water_spread: f64,
    pub renewable_water_multiplier: f64,
    pub thresholds: RecommendationThresholds,
    pub default_environmental_efficiency: f64,
    pub default_circularity: CircularityMetrics,
    pub classification: ClassificationDefaults,
    pub fallback_metrics: LcaMetrics,
    pub environmental_schema: &'static [FeatureColumn],
    pub circularity_schema: &'static [FeatureColumn],
    pub circularity_readout: CircularityReadout,
    pub copy: RecommendationCopy,
}

impl MaterialProfile {
    pub fn for_material(material: Material) -> &'static MaterialProfile {
        match material {
            Material::Aluminum => &ALUMINUM,
            Material::Copper => &COPPER,
        }
    }
}

const ALUMINUM_ENVIRONMENTAL: [FeatureColumn; 12] = [
    FeatureColumn::Fraction(InputField::ScrapRatio),
    FeatureColumn::Fraction(InputField::RecyclingRate),
    FeatureColumn::Fraction(InputField::WasteRatio),
    FeatureColumn::Fraction(InputField::EnergyRecoveryRate),
    FeatureColumn::Fraction(InputField::SecondaryMaterialFraction),
    FeatureColumn::Fraction(InputField::MaterialEfficiency),
    FeatureColumn::SpecificEnergy,
    FeatureColumn::Flag(InputField::IsMetallurgy),
    FeatureColumn::Flag(InputField::HasCircularity),
    FeatureColumn::LogScale(InputField::TotalInputs),
    FeatureColumn::LogScale(InputField::TotalOutputs),
    FeatureColumn::EnergyEfficiencyProxy,
];

const ALUMINUM_CIRCULARITY: [FeatureColumn; 6] = [
    FeatureColumn::Fraction(InputField::MaterialEfficiency),
    FeatureColumn::Fraction(InputField::SecondaryMaterialFraction),
    FeatureColumn::SpecificEnergy,
    FeatureColumn::Flag(InputField::IsMetallurgy),
    FeatureColumn::LogScale(InputField::TotalInputs),
    FeatureColumn::LogScale(InputField::TotalOutputs),
];

const COPPER_ENVIRONMENTAL: [FeatureColumn; 12] = [
    FeatureColumn::Scale(InputField::ProductionScale),
    FeatureColumn::EnergyCode,
    FeatureColumn::LocationCode,
    FeatureColumn::Fraction(InputField::RecyclingRate),
    FeatureColumn::Fraction(InputField::MaterialEfficiency),
    FeatureColumn::Fraction(InputField::ScrapRatio),
    FeatureColumn::Fraction(InputField::SecondaryMaterialFraction),
    FeatureColumn::Fraction(InputField::EnergyRecoveryRate),
    FeatureColumn::Scale(InputField::TotalInputs),
    FeatureColumn::Scale(InputField::TotalOutputs),
    FeatureColumn::Flag(InputField::IsMetallurgy),
    FeatureColumn::Flag(InputField::HasCircularity),
];

const COPPER_CIRCULARITY: [FeatureColumn; 10] = [
    FeatureColumn::Scale(InputField::ProductionScale),
    FeatureColumn::EnergyCode,
    FeatureColumn::Fraction(InputField::MaterialEfficiency),
    FeatureColumn::Fraction(InputField::ScrapRatio),
    FeatureColumn::Fraction(InputField::SecondaryMaterialFraction),
    FeatureColumn::Fraction(InputField::EnergyRecoveryRate),
    FeatureColumn::Scale(InputField::TotalInputs),
    FeatureColumn::Scale(InputField::TotalOutputs),
    FeatureColumn::Flag(InputField::IsMetallurgy),
    FeatureColumn::Flag(InputField::HasCircularity),
];

pub static ALUMINUM: MaterialProfile = MaterialProfile {
    material: Material::Aluminum,
    data_quality: "aluminum_industry_validated",
    base_energy: BySource {
        renewable: 3.5,
        grid: 4.8,
        fossil: 6.2,
    },
    efficiency_amplifier: 1.5,
    emission_factor: BySource {
        renewable: 0.02,
        grid: 0.15,
        fossil: 0.25,
    },
    process_emission: 0.08,
    water_base: 2.5,
    water_spread: 5.0,
    renewable_water_multiplier: 0.8,
    thresholds: RecommendationThresholds {
        min_environmental_efficiency: 0.7,
        min_recycling_rate: 0.8,
        max_carbon_intensity: 1.0,
        max_water_intensity: 5.0,
    },
    default_environmental_efficiency: 0.75,
    default_circularity: CircularityMetrics {
        circularity_index: 0.85,
        recycling_rate: 0.85,
        waste_ratio: 0.08,
        material_efficiency: 0.83,
    },
    classification: ClassificationDefaults {
        class_name: "Secondary Aluminum Recycling",
        class_id: 1,
        confidence: 0.7,
        live_confidence: 0.9,
    },
    fallback_metrics: LcaMetrics {
        carbon_footprint: 250.0,
        energy_consumption: 2250.0,
        water_usage: 1250.0,
    },
    environmental_schema: &ALUMINUM_ENVIRONMENTAL,
    circularity_schema: &ALUMINUM_CIRCULARITY,
    circularity_readout: CircularityReadout::MultiOutput {
        index: 1,
        recycling: 1,
        waste: 2,
    },
    copy: RecommendationCopy {
        process_optimization: "Optimize aluminum melting process efficiency to reduce carbon intensity",
        water_recycling: "Implement closed-loop water recycling to minimize aluminum processing water consumption",
    },
};

pub static COPPER: MaterialProfile = MaterialProfile {
    material: Material::Copper,
    data_quality: "ICA_EPA_copper_standards",
    base_energy: BySource {
        renewable: 12.0,
        grid: 18.0,
        fossil: 25.0,
    },
    efficiency_amplifier: 1.8,
    emission_factor: BySource {
        renewable: 0.03,
        grid: 0.18,
        fossil: 0.30,
    },
    process_emission: 0.15,
    water_base: 35.0,
    water_spread: 50.0,
    renewable_water_multiplier: 0.75,
    thresholds: RecommendationThresholds {
        min_environmental_efficiency: 0.7,
        min_recycling_rate: 0.75,
        max_carbon_intensity: 2.0,
        max_water_intensity: 60.0,
    },
    default_environmental_efficiency: 0.70,
    default_circularity: CircularityMetrics {
        circularity_index: 0.75,
        recycling_rate: 0.80,
        waste_ratio: 0.12,
        material_efficiency: 0.78,
    },
    classification: ClassificationDefaults {
        class_name: "secondary_copper_recycling",
        class_id: 1,
        confidence: 0.7,
        live_confidence: 0.9,
    },
    fallback_metrics: LcaMetrics {
        carbon_footprint: 500.0,
        energy_consumption: 9000.0,
        water_usage: 25000.0,
    },
    environmental_schema: &COPPER_ENVIRONMENTAL,
    circularity_schema: &COPPER_CIRCULARITY,
    circularity_readout: CircularityReadout::IndexFirst {
        fallback_waste_ratio: 0.15,
    },
    copy: RecommendationCopy {
        process_optimization: "Optimize copper smelting and refining processes to reduce carbon intensity",
        water_recycling: "Implement advanced water recycling systems for copper processing",
    },
};
