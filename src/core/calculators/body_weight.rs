use serde::{Deserialize, Serialize};

use crate::core::error::{CalcError, ensure_range};
use crate::core::types::{Sex, UnitSystem};

const BASE_HEIGHT_IN: f64 = 60.0;
const HEALTHY_BMI: (f64, f64) = (18.5, 24.9);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Formula {
    Robinson,
    Miller,
    Devine,
    Hamwi,
}

impl Formula {
    pub const ALL: [Formula; 4] = [
        Formula::Robinson,
        Formula::Miller,
        Formula::Devine,
        Formula::Hamwi,
    ];

    // (base kg at five feet, kg per inch) for male and female.
    fn coefficients(self, sex: Sex) -> (f64, f64) {
        match (self, sex) {
            (Formula::Robinson, Sex::Male) => (52.0, 1.9),
            (Formula::Robinson, Sex::Female) => (49.0, 1.7),
            (Formula::Miller, Sex::Male) => (56.2, 1.41),
            (Formula::Miller, Sex::Female) => (53.1, 1.36),
            (Formula::Devine, Sex::Male) => (50.0, 2.3),
            (Formula::Devine, Sex::Female) => (45.5, 2.3),
            (Formula::Hamwi, Sex::Male) => (48.0, 2.7),
            (Formula::Hamwi, Sex::Female) => (45.5, 2.2),
        }
    }

    pub fn ideal_kg(self, sex: Sex, height_in: f64) -> f64 {
        let (base, per_inch) = self.coefficients(sex);
        (base + per_inch * (height_in - BASE_HEIGHT_IN)).max(0.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub sex: Sex,
    pub height: f64,
    #[serde(default)]
    pub unit_system: UnitSystem,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaResult {
    pub formula: Formula,
    pub kg: f64,
    pub lb: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub unit_system: UnitSystem,
    pub height_inches: f64,
    pub formulas: Vec<FormulaResult>,
    pub average: f64,
    pub healthy_min: f64,
    pub healthy_max: f64,
}

pub fn calculate(input: &Input) -> Result<Output, CalcError> {
    let height_in = input.unit_system.length_to_inches(input.height);
    ensure_range("height", height_in, 36.0, 96.0).map_err(|_| {
        CalcError::invalid("height", "must be between 36 and 96 inches (91 to 244 cm)")
    })?;

    let formulas = Formula::ALL
        .iter()
        .map(|&formula| {
            let kg = formula.ideal_kg(input.sex, height_in);
            FormulaResult {
                formula,
                kg,
                lb: UnitSystem::Imperial.kg_to_weight(kg),
                weight: input.unit_system.kg_to_weight(kg),
            }
        })
        .collect::<Vec<_>>();
    let average = formulas.iter().map(|f| f.weight).sum::<f64>() / formulas.len() as f64;

    let height_m = height_in * 0.0254;
    let (low_bmi, high_bmi) = HEALTHY_BMI;

    Ok(Output {
        unit_system: input.unit_system,
        height_inches: height_in,
        formulas,
        average,
        healthy_min: input.unit_system.kg_to_weight(low_bmi * height_m * height_m),
        healthy_max: input.unit_system.kg_to_weight(high_bmi * height_m * height_m),
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

    fn kg_for(out: &Output, formula: Formula) -> f64 {
        out.formulas
            .iter()
            .find(|f| f.formula == formula)
            .map(|f| f.kg)
            .expect("formula present")
    }

    #[test]
    fn male_five_ten_matches_published_values() {
        let out = calculate(&Input {
            sex: Sex::Male,
            height: 70.0,
            unit_system: UnitSystem::Imperial,
        })
        .expect("valid");
        assert_close(kg_for(&out, Formula::Robinson), 71.0, 1e-9);
        assert_close(kg_for(&out, Formula::Miller), 70.3, 1e-9);
        assert_close(kg_for(&out, Formula::Devine), 73.0, 1e-9);
        assert_close(kg_for(&out, Formula::Hamwi), 75.0, 1e-9);
        assert_close(out.average, 72.325 / 0.453_592_37, 1e-6);
    }

    #[test]
    fn metric_input_reports_kilograms() {
        let out = calculate(&Input {
            sex: Sex::Male,
            height: 177.8,
            unit_system: UnitSystem::Metric,
        })
        .expect("valid");
        assert_close(out.average, 72.325, 1e-6);
        assert_close(out.healthy_min, 58.484, 1e-3);
        assert_close(out.healthy_max, 78.716, 1e-3);
    }

    #[test]
    fn short_heights_reduce_linearly() {
        let out = calculate(&Input {
            sex: Sex::Female,
            height: 55.0,
            unit_system: UnitSystem::Imperial,
        })
        .expect("valid");
        assert_close(kg_for(&out, Formula::Devine), 34.0, 1e-9);
        assert_close(kg_for(&out, Formula::Robinson), 40.5, 1e-9);
    }

    #[test]
    fn rejects_implausible_height() {
        let err = calculate(&Input {
            sex: Sex::Female,
            height: 20.0,
            unit_system: UnitSystem::Imperial,
        })
        .expect_err("must reject");
        assert_eq!(err.field(), Some("height"));
    }
}
