use serde::{Deserialize, Serialize};

use crate::core::error::{CalcError, ensure_positive, ensure_range};

const CUBIC_FEET_PER_YARD: f64 = 27.0;
const CUBIC_METERS_PER_FOOT: f64 = 0.028_316_846_6;
// Yield in cubic feet for premixed bags.
const BAG_YIELDS: [(u32, f64); 3] = [(40, 0.30), (60, 0.45), (80, 0.60)];
const MAX_SPAN_FT: f64 = 1_000.0;
const MAX_THICKNESS_IN: f64 = 120.0;
const MAX_DIAMETER_IN: f64 = 240.0;
const MAX_QUANTITY: u32 = 1_000;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shape {
    #[default]
    Slab,
    Footing,
    #[serde(alias = "cylinder")]
    Column,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    #[serde(default)]
    pub shape: Shape,
    #[serde(default)]
    pub length_ft: f64,
    #[serde(default)]
    pub width_ft: f64,
    #[serde(default)]
    pub thickness_in: f64,
    #[serde(default)]
    pub diameter_in: f64,
    #[serde(default)]
    pub height_ft: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub waste_percent: f64,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BagCount {
    pub bag_weight_lb: u32,
    pub bags: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub shape: Shape,
    pub cubic_feet: f64,
    pub cubic_yards: f64,
    pub cubic_meters: f64,
    pub with_waste_cubic_feet: f64,
    pub with_waste_cubic_yards: f64,
    pub bags: Vec<BagCount>,
}

fn ensure_dimension(field: &'static str, value: f64, max: f64) -> Result<(), CalcError> {
    ensure_positive(field, value)?;
    ensure_range(field, value, 0.0, max)
}

fn validate(input: &Input) -> Result<(), CalcError> {
    match input.shape {
        Shape::Slab | Shape::Footing => {
            ensure_dimension("lengthFt", input.length_ft, MAX_SPAN_FT)?;
            ensure_dimension("widthFt", input.width_ft, MAX_SPAN_FT)?;
            ensure_dimension("thicknessIn", input.thickness_in, MAX_THICKNESS_IN)?;
        }
        Shape::Column => {
            ensure_dimension("diameterIn", input.diameter_in, MAX_DIAMETER_IN)?;
            ensure_dimension("heightFt", input.height_ft, MAX_SPAN_FT)?;
        }
    }
    if input.quantity == 0 || input.quantity > MAX_QUANTITY {
        return Err(CalcError::invalid(
            "quantity",
            format!("must be between 1 and {MAX_QUANTITY}"),
        ));
    }
    ensure_range("wastePercent", input.waste_percent, 0.0, 50.0)
}

pub fn calculate(input: &Input) -> Result<Output, CalcError> {
    validate(input)?;

    let single = match input.shape {
        Shape::Slab | Shape::Footing => input.length_ft * input.width_ft * (input.thickness_in / 12.0),
        Shape::Column => {
            let radius_ft = input.diameter_in / 12.0 / 2.0;
            std::f64::consts::PI * radius_ft * radius_ft * input.height_ft
        }
    };
    let cubic_feet = single * input.quantity as f64;
    let with_waste_cubic_feet = cubic_feet * (1.0 + input.waste_percent / 100.0);

    Ok(Output {
        shape: input.shape,
        cubic_feet,
        cubic_yards: cubic_feet / CUBIC_FEET_PER_YARD,
        cubic_meters: cubic_feet * CUBIC_METERS_PER_FOOT,
        with_waste_cubic_feet,
        with_waste_cubic_yards: with_waste_cubic_feet / CUBIC_FEET_PER_YARD,
        bags: BAG_YIELDS
            .iter()
            .map(|&(bag_weight_lb, yield_ft3)| BagCount {
                bag_weight_lb,
                bags: (with_waste_cubic_feet / yield_ft3 - 1e-9).ceil().max(0.0) as u64,
            })
            .collect(),
    })
}
