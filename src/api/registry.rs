use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::CalcError;
use crate::core::calculators::{
    body_fat, body_weight, concrete, confidence, credit_card, cycle, golf, grade, lease, protein,
    retirement, tip, voltage_drop,
};

pub trait Calculator: Send + Sync {
    fn id(&self) -> &'static str;
    fn title(&self) -> &'static str;
    fn summary(&self) -> &'static str;
    fn evaluate(&self, input: Value) -> Result<Value, CalcError>;
    fn evaluate_query(&self, query: &str) -> Result<Value, CalcError>;
}

pub struct Entry<I, O> {
    id: &'static str,
    title: &'static str,
    summary: &'static str,
    compute: fn(&I) -> Result<O, CalcError>,
}

impl<I, O> Entry<I, O>
where
    I: DeserializeOwned,
    O: Serialize,
{
    fn run(&self, input: I) -> Result<Value, CalcError> {
        let output = (self.compute)(&input)?;
        serde_json::to_value(output).map_err(|e| CalcError::Payload(e.to_string()))
    }
}

impl<I, O> Calculator for Entry<I, O>
where
    I: DeserializeOwned,
    O: Serialize,
{
    fn id(&self) -> &'static str {
        self.id
    }

    fn title(&self) -> &'static str {
        self.title
    }

    fn summary(&self) -> &'static str {
        self.summary
    }

    fn evaluate(&self, input: Value) -> Result<Value, CalcError> {
        let input = serde_json::from_value::<I>(input)
            .map_err(|e| CalcError::Payload(e.to_string()))?;
        self.run(input)
    }

    fn evaluate_query(&self, query: &str) -> Result<Value, CalcError> {
        let input = serde_urlencoded::from_str::<I>(query)
            .map_err(|e| CalcError::Payload(e.to_string()))?;
        self.run(input)
    }
}

macro_rules! entry {
    ($module:ident, $id:literal, $title:literal, $summary:literal) => {
        &Entry::<$module::Input, $module::Output> {
            id: $id,
            title: $title,
            summary: $summary,
            compute: $module::calculate,
        }
    };
}

static CALCULATORS: &[&dyn Calculator] = &[
    entry!(
        concrete,
        "concrete",
        "Concrete",
        "Volume and premixed bag counts for slabs, footings and columns"
    ),
    entry!(
        golf,
        "golf-handicap",
        "Golf handicap",
        "Score differentials, WHS handicap index and course handicap"
    ),
    entry!(
        tip,
        "tip",
        "Tip",
        "Tip, total and per-person split with optional round-up"
    ),
    entry!(
        voltage_drop,
        "voltage-drop",
        "Voltage drop",
        "Conductor voltage drop for copper or aluminum AWG wire"
    ),
    entry!(
        confidence,
        "confidence-interval",
        "Confidence interval",
        "t or z intervals for a mean and Wald/Wilson intervals for a proportion"
    ),
    entry!(
        credit_card,
        "credit-card-payoff",
        "Credit card payoff",
        "Payoff timeline and interest under fixed, minimum, avalanche or snowball payments"
    ),
    entry!(
        retirement,
        "401k",
        "401(k)",
        "Retirement balance projection with employer match and contribution limits"
    ),
    entry!(
        body_weight,
        "ideal-weight",
        "Ideal body weight",
        "Robinson, Miller, Devine and Hamwi estimates with the healthy BMI range"
    ),
    entry!(
        body_fat,
        "body-fat",
        "Body fat",
        "US Navy circumference body fat estimate"
    ),
    entry!(
        lease,
        "lease-vs-buy",
        "Lease vs buy",
        "Lease payment breakdown compared with financing the purchase"
    ),
    entry!(
        cycle,
        "period-cycle",
        "Period and ovulation",
        "Projected periods, ovulation and fertile windows"
    ),
    entry!(
        protein,
        "protein",
        "Protein intake",
        "Daily protein target by body weight, activity and goal"
    ),
    entry!(
        grade,
        "grade",
        "Test grade",
        "Percentage and letter grade from question counts or weighted categories"
    ),
];

#[derive(Debug, Clone, Serialize)]
pub struct CalculatorInfo {
    pub id: &'static str,
    pub title: &'static str,
    pub summary: &'static str,
}

pub fn all() -> &'static [&'static dyn Calculator] {
    CALCULATORS
}

pub fn catalog() -> Vec<CalculatorInfo> {
    CALCULATORS
        .iter()
        .map(|c| CalculatorInfo {
            id: c.id(),
            title: c.title(),
            summary: c.summary(),
        })
        .collect()
}

pub fn find(id: &str) -> Result<&'static dyn Calculator, CalcError> {
    CALCULATORS
        .iter()
        .copied()
        .find(|c| c.id() == id)
        .ok_or_else(|| CalcError::UnknownCalculator(id.to_string()))
}
