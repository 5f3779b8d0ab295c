use serde::{Deserialize, Serialize};

use crate::core::error::{CalcError, ensure_positive};

pub const RECOMMENDED_MAX_DROP_PERCENT: f64 = 3.0;

// NEC Chapter 9 Table 8, uncoated DC resistance at 75 C, ohms per 1000 ft.
const RESISTANCE_TABLE: [(&str, f64, f64); 13] = [
    ("14", 3.07, 5.06),
    ("12", 1.93, 3.18),
    ("10", 1.21, 2.00),
    ("8", 0.764, 1.26),
    ("6", 0.491, 0.808),
    ("4", 0.308, 0.508),
    ("3", 0.245, 0.403),
    ("2", 0.194, 0.319),
    ("1", 0.154, 0.253),
    ("1/0", 0.122, 0.201),
    ("2/0", 0.0967, 0.159),
    ("3/0", 0.0766, 0.126),
    ("4/0", 0.0608, 0.100),
];

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Material {
    #[default]
    #[serde(alias = "cu")]
    Copper,
    #[serde(alias = "al", alias = "aluminium")]
    Aluminum,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    #[default]
    #[serde(alias = "1", alias = "single-phase")]
    Single,
    #[serde(alias = "3", alias = "three-phase")]
    Three,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    #[serde(default)]
    pub material: Material,
    #[serde(deserialize_with = "super::string_or_number")]
    pub gauge: String,
    pub length_ft: f64,
    pub current_amps: f64,
    pub voltage: f64,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default = "default_conductors")]
    pub conductors_per_phase: u32,
}

fn default_conductors() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub gauge: String,
    pub material: Material,
    pub resistance_per_kft: f64,
    pub drop_volts: f64,
    pub drop_percent: f64,
    pub end_voltage: f64,
    pub within_recommendation: bool,
}

pub fn resistance_per_kft(material: Material, gauge: &str) -> Option<f64> {
    let normalized = normalize_gauge(gauge);
    RESISTANCE_TABLE
        .iter()
        .find(|(g, _, _)| *g == normalized)
        .map(|&(_, copper, aluminum)| match material {
            Material::Copper => copper,
            Material::Aluminum => aluminum,
        })
}

fn normalize_gauge(gauge: &str) -> String {
    let trimmed = gauge.trim().trim_start_matches("AWG").trim_start_matches("awg").trim();
    match trimmed {
        "0" | "1/0" => "1/0".to_string(),
        "00" | "2/0" => "2/0".to_string(),
        "000" | "3/0" => "3/0".to_string(),
        "0000" | "4/0" => "4/0".to_string(),
        other => other.to_string(),
    }
}

pub fn calculate(input: &Input) -> Result<Output, CalcError> {
    ensure_positive("lengthFt", input.length_ft)?;
    ensure_positive("currentAmps", input.current_amps)?;
    ensure_positive("voltage", input.voltage)?;
    if input.conductors_per_phase == 0 || input.conductors_per_phase > 10 {
        return Err(CalcError::invalid(
            "conductorsPerPhase",
            "must be between 1 and 10",
        ));
    }
    let resistance = resistance_per_kft(input.material, &input.gauge).ok_or_else(|| {
        CalcError::invalid("gauge", format!("unsupported AWG size '{}'", input.gauge))
    })?;

    let multiplier = match input.phase {
        Phase::Single => 2.0,
        Phase::Three => 3_f64.sqrt(),
    };
    let drop_volts = multiplier * input.length_ft * resistance * input.current_amps
        / 1000.0
        / input.conductors_per_phase as f64;
    let drop_percent = drop_volts / input.voltage * 100.0;

    Ok(Output {
        gauge: normalize_gauge(&input.gauge),
        material: input.material,
        resistance_per_kft: resistance,
        drop_volts,
        drop_percent,
        end_voltage: input.voltage - drop_volts,
        within_recommendation: drop_percent <= RECOMMENDED_MAX_DROP_PERCENT,
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

    fn input(gauge: &str, length_ft: f64, amps: f64, volts: f64) -> Input {
        Input {
            material: Material::Copper,
            gauge: gauge.to_string(),
            length_ft,
            current_amps: amps,
            voltage: volts,
            phase: Phase::Single,
            conductors_per_phase: 1,
        }
    }

    #[test]
    fn single_phase_copper_drop() {
        let out = calculate(&input("12", 100.0, 16.0, 120.0)).expect("valid");
        assert_close(out.drop_volts, 6.176, 1e-9);
        assert_close(out.drop_percent, 5.1467, 1e-3);
        assert!(!out.within_recommendation);
        assert_close(out.end_voltage, 113.824, 1e-9);
    }

    #[test]
    fn three_phase_uses_root_three() {
        let mut i = input("4/0", 250.0, 150.0, 480.0);
        i.phase = Phase::Three;
        let out = calculate(&i).expect("valid");
        assert_close(out.drop_volts, 3_f64.sqrt() * 250.0 * 0.0608 * 150.0 / 1000.0, 1e-9);
        assert!(out.within_recommendation);
    }

    #[test]
    fn aluminum_has_higher_drop_than_copper() {
        let copper = calculate(&input("6", 150.0, 40.0, 240.0)).expect("valid");
        let mut al = input("6", 150.0, 40.0, 240.0);
        al.material = Material::Aluminum;
        let aluminum = calculate(&al).expect("valid");
        assert!(aluminum.drop_volts > copper.drop_volts);
    }

    #[test]
    fn aught_sizes_accept_zero_notation() {
        assert_eq!(resistance_per_kft(Material::Copper, "00"), Some(0.0967));
        assert_eq!(resistance_per_kft(Material::Aluminum, "AWG 1/0"), Some(0.201));
    }

    #[test]
    fn parallel_conductors_divide_drop() {
        let one = calculate(&input("2", 300.0, 100.0, 240.0)).expect("valid");
        let mut i = input("2", 300.0, 100.0, 240.0);
        i.conductors_per_phase = 2;
        let two = calculate(&i).expect("valid");
        assert_close(two.drop_volts * 2.0, one.drop_volts, 1e-9);
    }

    #[test]
    fn numeric_gauge_in_json() {
        let parsed: Input = serde_json::from_value(serde_json::json!({
            "gauge": 10,
            "lengthFt": 50,
            "currentAmps": 20,
            "voltage": 240,
            "phase": "single"
        }))
        .expect("numeric gauge");
        assert_eq!(parsed.gauge, "10");
        assert_eq!(parsed.material, Material::Copper);
    }

    #[test]
    fn rejects_unknown_gauge() {
        let err = calculate(&input("13", 100.0, 10.0, 120.0)).expect_err("must reject");
        assert_eq!(err.field(), Some("gauge"));
    }
}
