use serde::{Deserialize, Serialize};

use crate::core::error::{CalcError, ensure_range};
use crate::core::types::WeightUnit;

pub const KCAL_PER_GRAM: f64 = 4.0;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Activity {
    Sedentary,
    #[serde(alias = "lightly-active")]
    Light,
    #[default]
    #[serde(alias = "moderately-active")]
    Moderate,
    #[serde(alias = "very-active")]
    Active,
    Athlete,
}

impl Activity {
    pub fn grams_per_kg(self) -> (f64, f64) {
        match self {
            Activity::Sedentary => (0.8, 1.0),
            Activity::Light => (1.0, 1.2),
            Activity::Moderate => (1.2, 1.6),
            Activity::Active => (1.6, 2.0),
            Activity::Athlete => (2.0, 2.2),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Goal {
    #[default]
    Maintain,
    #[serde(alias = "lose", alias = "fat-loss")]
    LoseFat,
    #[serde(alias = "gain", alias = "muscle-gain")]
    BuildMuscle,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub weight: f64,
    #[serde(default)]
    pub weight_unit: WeightUnit,
    #[serde(default)]
    pub activity: Activity,
    #[serde(default)]
    pub goal: Goal,
    #[serde(default = "default_meals")]
    pub meals_per_day: u32,
}

fn default_meals() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub weight_kg: f64,
    pub grams_per_kg: f64,
    pub min_grams: f64,
    pub max_grams: f64,
    pub grams_per_day: f64,
    pub grams_per_meal: f64,
    pub calories_from_protein: f64,
}

pub fn calculate(input: &Input) -> Result<Output, CalcError> {
    let weight_kg = input.weight_unit.to_kg(input.weight);
    ensure_range("weight", weight_kg, 20.0, 350.0).map_err(|_| {
        CalcError::invalid("weight", "must be between 20 and 350 kg (44 to 772 lb)")
    })?;
    if input.meals_per_day == 0 || input.meals_per_day > 8 {
        return Err(CalcError::invalid("mealsPerDay", "must be between 1 and 8"));
    }

    let (low, high) = input.activity.grams_per_kg();
    let grams_per_kg = match input.goal {
        Goal::Maintain => (low + high) / 2.0,
        Goal::LoseFat | Goal::BuildMuscle => high,
    };
    let grams_per_day = weight_kg * grams_per_kg;

    Ok(Output {
        weight_kg,
        grams_per_kg,
        min_grams: weight_kg * low,
        max_grams: weight_kg * high,
        grams_per_day,
        grams_per_meal: grams_per_day / input.meals_per_day as f64,
        calories_from_protein: grams_per_day * KCAL_PER_GRAM,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn input(weight: f64, activity: Activity, goal: Goal) -> Input {
        Input {
            weight,
            weight_unit: WeightUnit::Kg,
            activity,
            goal,
            meals_per_day: 4,
        }
    }

    #[test]
    fn maintain_uses_range_midpoint() {
        let out = calculate(&input(80.0, Activity::Moderate, Goal::Maintain)).expect("valid");
        assert_close(out.grams_per_kg, 1.4, 1e-12);
        assert_close(out.grams_per_day, 112.0, 1e-9);
        assert_close(out.min_grams, 96.0, 1e-9);
        assert_close(out.max_grams, 128.0, 1e-9);
        assert_close(out.grams_per_meal, 28.0, 1e-9);
        assert_close(out.calories_from_protein, 448.0, 1e-9);
    }

    #[test]
    fn building_muscle_targets_upper_bound() {
        let out = calculate(&input(70.0, Activity::Athlete, Goal::BuildMuscle)).expect("valid");
        assert_close(out.grams_per_day, 154.0, 1e-9);
    }

    #[test]
    fn pounds_are_converted() {
        let mut i = input(200.0, Activity::Sedentary, Goal::LoseFat);
        i.weight_unit = WeightUnit::Lb;
        let out = calculate(&i).expect("valid");
        assert_close(out.weight_kg, 90.718_474, 1e-6);
        assert_close(out.grams_per_day, 90.718_474, 1e-6);
    }

    #[test]
    fn rejects_zero_meals_and_tiny_weight() {
        let mut i = input(80.0, Activity::Light, Goal::Maintain);
        i.meals_per_day = 0;
        assert_eq!(calculate(&i).expect_err("must reject").field(), Some("mealsPerDay"));
        assert_eq!(
            calculate(&input(5.0, Activity::Light, Goal::Maintain))
                .expect_err("must reject")
                .field(),
            Some("weight")
        );
    }
}
