use serde::{Deserialize, Serialize};

use crate::core::engine::{MAX_PERIODS, monthly_rate, project_growth};
use crate::core::error::{CalcError, ensure_non_negative, ensure_positive, ensure_range};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountType {
    #[default]
    #[serde(alias = "pre-tax", alias = "pretax")]
    Traditional,
    Roth,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub current_age: u32,
    pub retirement_age: u32,
    #[serde(default)]
    pub current_balance: f64,
    pub annual_salary: f64,
    pub contribution_percent: f64,
    #[serde(default)]
    pub employer_match_percent: f64,
    #[serde(default)]
    pub employer_match_limit_percent: f64,
    #[serde(default)]
    pub salary_growth_percent: f64,
    pub annual_return_percent: f64,
    #[serde(default = "default_contribution_limit")]
    pub annual_contribution_limit: f64,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default = "default_retirement_tax_rate")]
    pub retirement_tax_rate_percent: f64,
    #[serde(default)]
    pub inflation_percent: f64,
}

fn default_contribution_limit() -> f64 {
    23_000.0
}

fn default_retirement_tax_rate() -> f64 {
    22.0
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRow {
    pub age: u32,
    pub salary: f64,
    pub employee_contribution: f64,
    pub employer_contribution: f64,
    pub growth: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub years: u32,
    pub final_balance: f64,
    pub total_employee_contributions: f64,
    pub total_employer_contributions: f64,
    pub total_growth: f64,
    pub after_tax_balance: f64,
    pub inflation_adjusted_balance: f64,
    pub yearly: Vec<YearRow>,
}

fn validate(input: &Input) -> Result<(), CalcError> {
    if input.current_age < 14 || input.current_age > 100 {
        return Err(CalcError::invalid("currentAge", "must be between 14 and 100"));
    }
    if input.retirement_age <= input.current_age {
        return Err(CalcError::invalid("retirementAge", "must be > currentAge"));
    }
    if input.retirement_age - input.current_age > MAX_PERIODS / 12 {
        return Err(CalcError::invalid(
            "retirementAge",
            format!("projection horizon cannot exceed {} years", MAX_PERIODS / 12),
        ));
    }
    ensure_non_negative("currentBalance", input.current_balance)?;
    ensure_positive("annualSalary", input.annual_salary)?;
    ensure_range("contributionPercent", input.contribution_percent, 0.0, 100.0)?;
    ensure_range("employerMatchPercent", input.employer_match_percent, 0.0, 200.0)?;
    ensure_range(
        "employerMatchLimitPercent",
        input.employer_match_limit_percent,
        0.0,
        100.0,
    )?;
    ensure_range("salaryGrowthPercent", input.salary_growth_percent, -50.0, 50.0)?;
    ensure_range("annualReturnPercent", input.annual_return_percent, -50.0, 50.0)?;
    ensure_non_negative("annualContributionLimit", input.annual_contribution_limit)?;
    ensure_range(
        "retirementTaxRatePercent",
        input.retirement_tax_rate_percent,
        0.0,
        100.0,
    )?;
    ensure_range("inflationPercent", input.inflation_percent, -20.0, 50.0)
}

#[derive(Debug, Default, Clone, Copy)]
struct YearTally {
    salary: f64,
    employee: f64,
    employer: f64,
}

pub fn calculate(input: &Input) -> Result<Output, CalcError> {
    validate(input)?;

    let years = input.retirement_age - input.current_age;
    let months = years * 12;
    let mut tallies = vec![YearTally::default(); years as usize];

    let entries = project_growth(
        input.current_balance,
        monthly_rate(input.annual_return_percent),
        months,
        |month| {
            let year = ((month - 1) / 12) as usize;
            let salary =
                input.annual_salary * (1.0 + input.salary_growth_percent / 100.0).powi(year as i32);
            let monthly_salary = salary / 12.0;
            let tally = &mut tallies[year];
            tally.salary = salary;

            let mut employee = monthly_salary * input.contribution_percent / 100.0;
            if input.annual_contribution_limit > 0.0 {
                employee = employee.min((input.annual_contribution_limit - tally.employee).max(0.0));
            }
            let matchable = employee.min(monthly_salary * input.employer_match_limit_percent / 100.0);
            let employer = matchable * input.employer_match_percent / 100.0;

            tally.employee += employee;
            tally.employer += employer;
            employee + employer
        },
    );

    let mut yearly = Vec::with_capacity(years as usize);
    let mut total_growth = 0.0;
    for (idx, chunk) in entries.chunks(12).enumerate() {
        let growth = chunk.iter().map(|e| e.interest).sum::<f64>();
        total_growth += growth;
        let tally = tallies[idx];
        yearly.push(YearRow {
            age: input.current_age + idx as u32 + 1,
            salary: tally.salary,
            employee_contribution: tally.employee,
            employer_contribution: tally.employer,
            growth,
            balance: chunk.last().map(|e| e.balance).unwrap_or(input.current_balance),
        });
    }

    let final_balance = entries
        .last()
        .map(|e| e.balance)
        .unwrap_or(input.current_balance);
    let after_tax_balance = match input.account_type {
        AccountType::Traditional => final_balance * (1.0 - input.retirement_tax_rate_percent / 100.0),
        AccountType::Roth => final_balance,
    };
    let inflation_adjusted_balance =
        final_balance / (1.0 + input.inflation_percent / 100.0).powi(years as i32);

    Ok(Output {
        years,
        final_balance,
        total_employee_contributions: tallies.iter().map(|t| t.employee).sum(),
        total_employer_contributions: tallies.iter().map(|t| t.employer).sum(),
        total_growth,
        after_tax_balance,
        inflation_adjusted_balance,
        yearly,
    })
}
