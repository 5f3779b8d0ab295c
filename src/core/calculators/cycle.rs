use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, Duration};

use crate::core::error::CalcError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub last_period_start: String,
    #[serde(default = "default_cycle_length")]
    pub cycle_length: u32,
    #[serde(default = "default_period_length")]
    pub period_length: u32,
    #[serde(default = "default_cycles")]
    pub cycles: u32,
    #[serde(default = "default_luteal_phase")]
    pub luteal_phase: u32,
}

fn default_cycle_length() -> u32 {
    28
}

fn default_period_length() -> u32 {
    5
}

fn default_cycles() -> u32 {
    3
}

fn default_luteal_phase() -> u32 {
    14
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleWindow {
    pub cycle: u32,
    pub period_start: String,
    pub period_end: String,
    pub ovulation: String,
    pub fertile_start: String,
    pub fertile_end: String,
    pub next_period_start: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub cycle_length: u32,
    pub period_length: u32,
    pub luteal_phase: u32,
    pub cycles: Vec<CycleWindow>,
}

pub fn parse_date(field: &'static str, raw: &str) -> Result<Date, CalcError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| CalcError::invalid(field, format!("'{raw}' is not a YYYY-MM-DD date")))
}

fn format_date(date: Date) -> Result<String, CalcError> {
    date.format(format_description!("[year]-[month]-[day]"))
        .map_err(|err| CalcError::invalid("lastPeriodStart", err.to_string()))
}

fn shift(date: Date, days: i64) -> Result<Date, CalcError> {
    date.checked_add(Duration::days(days))
        .ok_or_else(|| CalcError::invalid("lastPeriodStart", "projected date is out of range"))
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), CalcError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(CalcError::invalid(
            field,
            format!("must be between {min} and {max}"),
        ))
    }
}

pub fn calculate(input: &Input) -> Result<Output, CalcError> {
    let last_start = parse_date("lastPeriodStart", &input.last_period_start)?;
    check_range("cycleLength", input.cycle_length, 21, 45)?;
    check_range("periodLength", input.period_length, 2, 10)?;
    check_range("cycles", input.cycles, 1, 12)?;
    check_range("lutealPhase", input.luteal_phase, 10, 16)?;

    let length = i64::from(input.cycle_length);
    let mut cycles = Vec::with_capacity(input.cycles as usize);
    for idx in 0..input.cycles {
        let start = shift(last_start, length * i64::from(idx))?;
        let next_start = shift(start, length)?;
        let ovulation = shift(next_start, -i64::from(input.luteal_phase))?;
        cycles.push(CycleWindow {
            cycle: idx + 1,
            period_start: format_date(start)?,
            period_end: format_date(shift(start, i64::from(input.period_length) - 1)?)?,
            ovulation: format_date(ovulation)?,
            fertile_start: format_date(shift(ovulation, -5)?)?,
            fertile_end: format_date(shift(ovulation, 1)?)?,
            next_period_start: format_date(next_start)?,
        });
    }

    Ok(Output {
        cycle_length: input.cycle_length,
        period_length: input.period_length,
        luteal_phase: input.luteal_phase,
        cycles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(start: &str) -> Input {
        Input {
            last_period_start: start.to_string(),
            cycle_length: 28,
            period_length: 5,
            cycles: 3,
            luteal_phase: 14,
        }
    }

    #[test]
    fn first_cycle_windows() {
        let out = calculate(&input("2024-01-01")).expect("valid");
        let first = &out.cycles[0];
        assert_eq!(first.period_start, "2024-01-01");
        assert_eq!(first.period_end, "2024-01-05");
        assert_eq!(first.ovulation, "2024-01-15");
        assert_eq!(first.fertile_start, "2024-01-10");
        assert_eq!(first.fertile_end, "2024-01-16");
        assert_eq!(first.next_period_start, "2024-01-29");
    }

    #[test]
    fn cycles_step_by_cycle_length_across_leap_day() {
        let out = calculate(&input("2024-01-01")).expect("valid");
        let starts = out
            .cycles
            .iter()
            .map(|c| c.period_start.as_str())
            .collect::<Vec<_>>();
        assert_eq!(starts, ["2024-01-01", "2024-01-29", "2024-02-26"]);
        assert_eq!(out.cycles[2].next_period_start, "2024-03-25");
    }

    #[test]
    fn shorter_luteal_phase_moves_ovulation_later() {
        let mut i = input("2024-03-10");
        i.luteal_phase = 12;
        i.cycles = 1;
        let out = calculate(&i).expect("valid");
        assert_eq!(out.cycles[0].ovulation, "2024-03-26");
    }

    #[test]
    fn rejects_malformed_date_and_out_of_range_lengths() {
        let err = calculate(&input("01/02/2024")).expect_err("must reject");
        assert_eq!(err.field(), Some("lastPeriodStart"));

        let mut i = input("2024-01-01");
        i.cycle_length = 50;
        assert_eq!(calculate(&i).expect_err("must reject").field(), Some("cycleLength"));
    }
}
