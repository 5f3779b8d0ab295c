use serde::{Deserialize, Serialize};

use crate::core::error::{CalcError, ensure_finite, ensure_non_negative};
use crate::core::stats::{normal_quantile, student_t_quantile};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    #[default]
    Mean,
    Proportion,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Distribution {
    #[default]
    #[serde(alias = "student-t", alias = "studentT")]
    T,
    #[serde(alias = "normal")]
    Z,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    #[serde(default)]
    pub kind: Kind,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub successes: Option<u64>,
    pub sample_size: u64,
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    #[serde(default)]
    pub distribution: Distribution,
}

fn default_confidence_level() -> f64 {
    95.0
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub kind: Kind,
    pub confidence_level: f64,
    pub point_estimate: f64,
    pub standard_error: f64,
    pub critical_value: f64,
    pub margin_of_error: f64,
    pub lower: f64,
    pub upper: f64,
    pub degrees_of_freedom: Option<u64>,
    pub wilson_lower: Option<f64>,
    pub wilson_upper: Option<f64>,
}

fn validate(input: &Input) -> Result<(), CalcError> {
    ensure_finite("confidenceLevel", input.confidence_level)?;
    if input.confidence_level <= 0.0 || input.confidence_level >= 100.0 {
        return Err(CalcError::invalid(
            "confidenceLevel",
            "must be strictly between 0 and 100",
        ));
    }
    if input.sample_size < 2 {
        return Err(CalcError::invalid("sampleSize", "must be >= 2"));
    }
    match input.kind {
        Kind::Mean => {
            let Some(mean) = input.mean else {
                return Err(CalcError::invalid("mean", "is required"));
            };
            ensure_finite("mean", mean)?;
            let Some(std_dev) = input.std_dev else {
                return Err(CalcError::invalid("stdDev", "is required"));
            };
            ensure_non_negative("stdDev", std_dev)?;
        }
        Kind::Proportion => {
            let Some(successes) = input.successes else {
                return Err(CalcError::invalid("successes", "is required"));
            };
            if successes > input.sample_size {
                return Err(CalcError::invalid(
                    "successes",
                    "cannot exceed sampleSize",
                ));
            }
        }
    }
    Ok(())
}

pub fn calculate(input: &Input) -> Result<Output, CalcError> {
    validate(input)?;

    let alpha = 1.0 - input.confidence_level / 100.0;
    let upper_tail = 1.0 - alpha / 2.0;
    let n = input.sample_size as f64;

    match input.kind {
        Kind::Mean => {
            let mean = input.mean.unwrap_or_default();
            let std_dev = input.std_dev.unwrap_or_default();
            let standard_error = std_dev / n.sqrt();
            let (critical_value, degrees_of_freedom) = match input.distribution {
                Distribution::T => {
                    let df = input.sample_size - 1;
                    (student_t_quantile(upper_tail, df as f64), Some(df))
                }
                Distribution::Z => (normal_quantile(upper_tail), None),
            };
            let margin_of_error = critical_value * standard_error;
            Ok(Output {
                kind: Kind::Mean,
                confidence_level: input.confidence_level,
                point_estimate: mean,
                standard_error,
                critical_value,
                margin_of_error,
                lower: mean - margin_of_error,
                upper: mean + margin_of_error,
                degrees_of_freedom,
                wilson_lower: None,
                wilson_upper: None,
            })
        }
        Kind::Proportion => {
            let successes = input.successes.unwrap_or_default() as f64;
            let p = successes / n;
            let z = normal_quantile(upper_tail);
            let standard_error = (p * (1.0 - p) / n).sqrt();
            let margin_of_error = z * standard_error;
            let (wilson_lower, wilson_upper) = wilson_interval(p, n, z);
            Ok(Output {
                kind: Kind::Proportion,
                confidence_level: input.confidence_level,
                point_estimate: p,
                standard_error,
                critical_value: z,
                margin_of_error,
                lower: (p - margin_of_error).max(0.0),
                upper: (p + margin_of_error).min(1.0),
                degrees_of_freedom: None,
                wilson_lower: Some(wilson_lower),
                wilson_upper: Some(wilson_upper),
            })
        }
    }
}

fn wilson_interval(p: f64, n: f64, z: f64) -> (f64, f64) {
    let z2 = z * z;
    let denom = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denom;
    let half = z / denom * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();
    ((center - half).max(0.0), (center + half).min(1.0))
}
