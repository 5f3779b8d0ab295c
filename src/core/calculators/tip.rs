use serde::{Deserialize, Serialize};

use crate::core::error::{CalcError, ensure_non_negative, ensure_positive, ensure_range};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TipBasis {
    #[default]
    #[serde(alias = "preTax", alias = "pre_tax")]
    PreTax,
    #[serde(alias = "postTax", alias = "post_tax")]
    PostTax,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundUp {
    #[default]
    None,
    #[serde(alias = "perPerson", alias = "per_person")]
    PerPerson,
    Total,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub bill: f64,
    pub tip_percent: f64,
    #[serde(default)]
    pub tax_amount: f64,
    #[serde(default)]
    pub tip_on: TipBasis,
    #[serde(default = "default_people")]
    pub people: u32,
    #[serde(default)]
    pub round_up: RoundUp,
}

fn default_people() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub tip: f64,
    pub tax: f64,
    pub subtotal: f64,
    pub total: f64,
    pub people: u32,
    pub per_person: f64,
    pub tip_per_person: f64,
    pub effective_tip_percent: f64,
}

fn validate(input: &Input) -> Result<(), CalcError> {
    ensure_positive("bill", input.bill)?;
    ensure_range("tipPercent", input.tip_percent, 0.0, 100.0)?;
    ensure_non_negative("taxAmount", input.tax_amount)?;
    if input.people == 0 || input.people > 100 {
        return Err(CalcError::invalid("people", "must be between 1 and 100"));
    }
    Ok(())
}

pub fn calculate(input: &Input) -> Result<Output, CalcError> {
    validate(input)?;

    let base = match input.tip_on {
        TipBasis::PreTax => input.bill,
        TipBasis::PostTax => input.bill + input.tax_amount,
    };
    let people = input.people as f64;
    let mut tip = base * input.tip_percent / 100.0;
    let unrounded_total = input.bill + input.tax_amount + tip;

    let total = match input.round_up {
        RoundUp::None => unrounded_total,
        RoundUp::Total => round_up_cents(unrounded_total).ceil(),
        RoundUp::PerPerson => round_up_cents(unrounded_total / people).ceil() * people,
    };
    tip += total - unrounded_total;

    Ok(Output {
        tip,
        tax: input.tax_amount,
        subtotal: input.bill,
        total,
        people: input.people,
        per_person: total / people,
        tip_per_person: tip / people,
        effective_tip_percent: tip / base * 100.0,
    })
}

// Keeps 42.000000001 from rounding up to 43.
fn round_up_cents(value: f64) -> f64 {
    (value * 100.0 - 1e-6).ceil() / 100.0
}
