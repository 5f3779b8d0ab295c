use serde::{Deserialize, Serialize};

use crate::core::error::{CalcError, ensure_positive};
use crate::core::types::{Sex, UnitSystem};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Essential,
    Athletes,
    Fitness,
    Average,
    Obese,
}

impl Category {
    // ACE ranges; each bound is the first percentage outside the band.
    pub fn classify(sex: Sex, percent: f64) -> Self {
        let bounds = match sex {
            Sex::Male => [6.0, 14.0, 18.0, 25.0],
            Sex::Female => [14.0, 21.0, 25.0, 32.0],
        };
        if percent < bounds[0] {
            Category::Essential
        } else if percent < bounds[1] {
            Category::Athletes
        } else if percent < bounds[2] {
            Category::Fitness
        } else if percent < bounds[3] {
            Category::Average
        } else {
            Category::Obese
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub sex: Sex,
    #[serde(default)]
    pub unit_system: UnitSystem,
    pub height: f64,
    pub neck: f64,
    pub waist: f64,
    pub hip: Option<f64>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub body_fat_percent: f64,
    pub category: Category,
    pub fat_mass: Option<f64>,
    pub lean_mass: Option<f64>,
}

pub fn navy_body_fat(sex: Sex, height_in: f64, neck_in: f64, waist_in: f64, hip_in: f64) -> f64 {
    match sex {
        Sex::Male => {
            86.010 * (waist_in - neck_in).log10() - 70.041 * height_in.log10() + 36.76
        }
        Sex::Female => {
            163.205 * (waist_in + hip_in - neck_in).log10() - 97.684 * height_in.log10()
                - 78.387
        }
    }
}

pub fn calculate(input: &Input) -> Result<Output, CalcError> {
    ensure_positive("height", input.height)?;
    ensure_positive("neck", input.neck)?;
    ensure_positive("waist", input.waist)?;

    let to_in = |v: f64| input.unit_system.length_to_inches(v);
    let height = to_in(input.height);
    let neck = to_in(input.neck);
    let waist = to_in(input.waist);

    let hip = match input.sex {
        Sex::Male => 0.0,
        Sex::Female => {
            let Some(hip) = input.hip else {
                return Err(CalcError::invalid("hip", "is required for female estimates"));
            };
            ensure_positive("hip", hip)?;
            to_in(hip)
        }
    };

    let circumference = match input.sex {
        Sex::Male => waist - neck,
        Sex::Female => waist + hip - neck,
    };
    if circumference <= 0.0 {
        return Err(CalcError::invalid(
            "waist",
            "waist measurement must exceed the neck measurement",
        ));
    }

    let percent = navy_body_fat(input.sex, height, neck, waist, hip);
    if !percent.is_finite() || percent <= 0.0 || percent >= 100.0 {
        return Err(CalcError::invalid(
            "waist",
            "measurements do not produce a plausible body fat estimate",
        ));
    }

    let (fat_mass, lean_mass) = match input.weight {
        Some(weight) => {
            ensure_positive("weight", weight)?;
            let fat = weight * percent / 100.0;
            (Some(fat), Some(weight - fat))
        }
        None => (None, None),
    };

    Ok(Output {
        body_fat_percent: percent,
        category: Category::classify(input.sex, percent),
        fat_mass,
        lean_mass,
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

    fn male() -> Input {
        Input {
            sex: Sex::Male,
            unit_system: UnitSystem::Imperial,
            height: 70.0,
            neck: 15.0,
            waist: 34.0,
            hip: None,
            weight: Some(180.0),
        }
    }

    #[test]
    fn male_navy_estimate_and_mass_split() {
        let out = calculate(&male()).expect("valid");
        assert_close(out.body_fat_percent, 17.513, 1e-3);
        assert_eq!(out.category, Category::Fitness);
        assert_close(out.fat_mass.expect("weight given"), 31.524, 1e-3);
        assert_close(out.lean_mass.expect("weight given"), 148.476, 1e-3);
    }

    #[test]
    fn metric_measurements_match_imperial() {
        let out = calculate(&Input {
            unit_system: UnitSystem::Metric,
            height: 177.8,
            neck: 38.1,
            waist: 86.36,
            weight: None,
            ..male()
        })
        .expect("valid");
        assert_close(out.body_fat_percent, 17.513, 1e-3);
        assert!(out.fat_mass.is_none());
    }

    #[test]
    fn female_uses_hip_measurement() {
        let out = calculate(&Input {
            sex: Sex::Female,
            height: 65.0,
            neck: 13.0,
            waist: 30.0,
            hip: Some(38.0),
            weight: None,
            ..male()
        })
        .expect("valid");
        assert_close(out.body_fat_percent, 28.556, 1e-3);
        assert_eq!(out.category, Category::Average);
    }

    #[test]
    fn female_requires_hip() {
        let err = calculate(&Input {
            sex: Sex::Female,
            ..male()
        })
        .expect_err("must reject");
        assert_eq!(err.field(), Some("hip"));
    }

    #[test]
    fn rejects_waist_not_exceeding_neck() {
        let err = calculate(&Input {
            waist: 15.0,
            ..male()
        })
        .expect_err("must reject");
        assert_eq!(err.field(), Some("waist"));
    }

    #[test]
    fn category_boundaries() {
        assert_eq!(Category::classify(Sex::Male, 5.9), Category::Essential);
        assert_eq!(Category::classify(Sex::Male, 6.0), Category::Athletes);
        assert_eq!(Category::classify(Sex::Male, 25.0), Category::Obese);
        assert_eq!(Category::classify(Sex::Female, 31.9), Category::Average);
        assert_eq!(Category::classify(Sex::Female, 32.0), Category::Obese);
    }
}
