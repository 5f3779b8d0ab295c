pub mod body_fat;
pub mod body_weight;
pub mod concrete;
pub mod confidence;
pub mod credit_card;
pub mod cycle;
pub mod golf;
pub mod grade;
pub mod lease;
pub mod protein;
pub mod retirement;
pub mod tip;
pub mod voltage_drop;

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Int(i64),
    Float(f64),
}

// Lets share links and JSON bodies both carry labels such as wire gauges.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Text(text) => text,
        StringOrNumber::Int(value) => value.to_string(),
        StringOrNumber::Float(value) => value.to_string(),
    })
}
