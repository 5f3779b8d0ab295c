use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitSystem {
    #[default]
    #[serde(alias = "us", alias = "imperial-us")]
    Imperial,
    #[serde(alias = "si")]
    Metric,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sex {
    #[serde(alias = "m")]
    Male,
    #[serde(alias = "f")]
    Female,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeightUnit {
    #[default]
    #[serde(alias = "kilograms")]
    Kg,
    #[serde(alias = "lbs", alias = "pounds")]
    Lb,
}

pub const KG_PER_LB: f64 = 0.453_592_37;
pub const CM_PER_INCH: f64 = 2.54;

impl UnitSystem {
    pub fn length_to_inches(self, value: f64) -> f64 {
        match self {
            UnitSystem::Imperial => value,
            UnitSystem::Metric => value / CM_PER_INCH,
        }
    }

    pub fn weight_to_kg(self, value: f64) -> f64 {
        match self {
            UnitSystem::Imperial => value * KG_PER_LB,
            UnitSystem::Metric => value,
        }
    }

    pub fn kg_to_weight(self, kg: f64) -> f64 {
        match self {
            UnitSystem::Imperial => kg / KG_PER_LB,
            UnitSystem::Metric => kg,
        }
    }
}

impl WeightUnit {
    pub fn to_kg(self, value: f64) -> f64 {
        match self {
            WeightUnit::Kg => value,
            WeightUnit::Lb => value * KG_PER_LB,
        }
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}
