use serde::{Deserialize, Serialize};

use crate::core::engine::{
    Account, AccountSummary, AmortizationInputs, MAX_PERIODS, PaymentRule, PayoffOrder,
    Schedule, amortize, amortize_accounts, monthly_rate,
};
use crate::core::error::{CalcError, ensure_non_negative, ensure_range};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[serde(alias = "fixed-payment", alias = "fixedPayment")]
    Fixed,
    #[serde(alias = "minimum-payment", alias = "minimumPayment")]
    Minimum,
    #[default]
    Avalanche,
    Snowball,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInput {
    #[serde(default)]
    pub name: Option<String>,
    pub balance: f64,
    pub apr: f64,
    /// Floor of the card's minimum under the `minimum` strategy; the
    /// percent rule still applies above it.
    pub minimum_payment: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    #[serde(default)]
    pub cards: Vec<CardInput>,
    pub balance: Option<f64>,
    pub apr: Option<f64>,
    pub minimum_payment: Option<f64>,
    #[serde(default)]
    pub strategy: Strategy,
    pub monthly_payment: Option<f64>,
    #[serde(default = "default_minimum_percent")]
    pub minimum_percent: f64,
    #[serde(default = "default_minimum_floor")]
    pub minimum_floor: f64,
}

fn default_minimum_percent() -> f64 {
    2.0
}

fn default_minimum_floor() -> f64 {
    25.0
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRow {
    pub month: u32,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyComparison {
    pub strategy: Strategy,
    pub months: Option<u32>,
    pub total_interest: Option<f64>,
    pub total_paid: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub strategy: Strategy,
    pub months: u32,
    pub starting_balance: f64,
    pub total_paid: f64,
    pub total_interest: f64,
    pub cards: Vec<AccountSummary>,
    pub schedule: Vec<ScheduleRow>,
    pub comparison: Option<Vec<StrategyComparison>>,
}

fn collect_accounts(input: &Input) -> Result<Vec<Account>, CalcError> {
    let mut cards = input.cards.clone();
    match (input.balance, input.apr) {
        (Some(balance), Some(apr)) => cards.push(CardInput {
            name: None,
            balance,
            apr,
            minimum_payment: input.minimum_payment,
        }),
        (None, None) => {}
        (Some(_), None) => return Err(CalcError::invalid("apr", "is required with balance")),
        (None, Some(_)) => return Err(CalcError::invalid("balance", "is required with apr")),
    }
    if cards.is_empty() {
        return Err(CalcError::invalid("cards", "at least one card is required"));
    }
    if cards.len() > 20 {
        return Err(CalcError::invalid("cards", "at most 20 cards are supported"));
    }

    cards
        .into_iter()
        .enumerate()
        .map(|(idx, card)| {
            ensure_non_negative("balance", card.balance)?;
            ensure_range("apr", card.apr, 0.0, 100.0)?;
            let minimum_payment = match card.minimum_payment {
                Some(v) => {
                    ensure_non_negative("minimumPayment", v)?;
                    v
                }
                None => (card.balance * input.minimum_percent / 100.0)
                    .max(input.minimum_floor)
                    .min(card.balance),
            };
            Ok(Account {
                name: card.name.unwrap_or_else(|| format!("Card {}", idx + 1)),
                balance: card.balance,
                annual_rate_percent: card.apr,
                minimum_payment,
            })
        })
        .collect()
}

// Per-card floors for the minimum strategy, in `collect_accounts` order.
fn minimum_floors(input: &Input) -> Vec<f64> {
    let flat = input.balance.map(|_| input.minimum_payment);
    input
        .cards
        .iter()
        .map(|card| card.minimum_payment)
        .chain(flat)
        .map(|minimum| minimum.unwrap_or(input.minimum_floor))
        .collect()
}

fn validate(input: &Input) -> Result<(), CalcError> {
    ensure_range("minimumPercent", input.minimum_percent, 0.0, 100.0)?;
    ensure_non_negative("minimumFloor", input.minimum_floor)?;
    match input.strategy {
        Strategy::Minimum => {
            if input.minimum_percent == 0.0 && input.minimum_floor == 0.0 {
                return Err(CalcError::invalid(
                    "minimumPercent",
                    "minimum percent and floor cannot both be zero",
                ));
            }
        }
        Strategy::Fixed | Strategy::Avalanche | Strategy::Snowball => {
            let Some(payment) = input.monthly_payment else {
                return Err(CalcError::invalid(
                    "monthlyPayment",
                    "is required for this strategy",
                ));
            };
            if !payment.is_finite() || payment <= 0.0 {
                return Err(CalcError::invalid("monthlyPayment", "must be > 0"));
            }
        }
    }
    Ok(())
}

pub fn calculate(input: &Input) -> Result<Output, CalcError> {
    validate(input)?;
    let accounts = collect_accounts(input)?;
    let starting_balance = accounts.iter().map(|a| a.balance).sum::<f64>();
    if starting_balance <= 0.0 {
        return Err(CalcError::invalid("balance", "total balance must be > 0"));
    }

    let mut output = run_strategy(input, &accounts, input.strategy)?;

    if accounts.len() > 1 && input.monthly_payment.is_some() {
        let comparison = [Strategy::Avalanche, Strategy::Snowball, Strategy::Fixed]
            .into_iter()
            .map(|strategy| match run_strategy(input, &accounts, strategy) {
                Ok(o) => StrategyComparison {
                    strategy,
                    months: Some(o.months),
                    total_interest: Some(o.total_interest),
                    total_paid: Some(o.total_paid),
                    error: None,
                },
                Err(err) => {
                    tracing::debug!(
                        ?strategy,
                        error = %err,
                        "comparison strategy did not pay off"
                    );
                    StrategyComparison {
                        strategy,
                        months: None,
                        total_interest: None,
                        total_paid: None,
                        error: Some(err.to_string()),
                    }
                }
            })
            .collect::<Vec<_>>();
        output.comparison = Some(comparison);
    }

    Ok(output)
}

fn run_strategy(
    input: &Input,
    accounts: &[Account],
    strategy: Strategy,
) -> Result<Output, CalcError> {
    let budget = input.monthly_payment.unwrap_or_default();
    match strategy {
        Strategy::Avalanche | Strategy::Snowball => {
            let order = if strategy == Strategy::Avalanche {
                PayoffOrder::Avalanche
            } else {
                PayoffOrder::Snowball
            };
            let schedule = amortize_accounts(accounts, budget, order, MAX_PERIODS)?;
            Ok(Output {
                strategy,
                months: schedule.periods,
                starting_balance: accounts.iter().map(|a| a.balance).sum(),
                total_paid: schedule.total_paid,
                total_interest: schedule.total_interest,
                cards: schedule.accounts,
                schedule: schedule
                    .entries
                    .iter()
                    .map(|e| ScheduleRow {
                        month: e.period,
                        payment: e.payment,
                        principal: e.principal,
                        interest: e.interest,
                        balance: e.balance,
                    })
                    .collect(),
                comparison: None,
            })
        }
        Strategy::Fixed | Strategy::Minimum => {
            let total = accounts.iter().map(|a| a.balance).sum::<f64>();
            let floors = minimum_floors(input);
            let mut schedules = Vec::with_capacity(accounts.len());
            for (account, floor) in accounts.iter().zip(floors) {
                if account.balance <= 0.0 {
                    schedules.push(None);
                    continue;
                }
                let payment_rule = if strategy == Strategy::Fixed {
                    PaymentRule::Fixed {
                        payment: budget * account.balance / total,
                    }
                } else {
                    PaymentRule::MinimumPercent {
                        percent: input.minimum_percent / 100.0,
                        floor,
                    }
                };
                schedules.push(Some(amortize(&AmortizationInputs {
                    starting_balance: account.balance,
                    periodic_rate: monthly_rate(account.annual_rate_percent),
                    payment_rule,
                    cap_periods: MAX_PERIODS,
                })?));
            }
            Ok(combine_independent(strategy, accounts, &schedules))
        }
    }
}

fn combine_independent(
    strategy: Strategy,
    accounts: &[Account],
    schedules: &[Option<Schedule>],
) -> Output {
    let months = schedules
        .iter()
        .flatten()
        .map(|s| s.periods)
        .max()
        .unwrap_or(0);

    let mut rows = (1..=months)
        .map(|month| ScheduleRow {
            month,
            payment: 0.0,
            principal: 0.0,
            interest: 0.0,
            balance: 0.0,
        })
        .collect::<Vec<_>>();
    for schedule in schedules.iter().flatten() {
        for entry in &schedule.entries {
            let row = &mut rows[(entry.period - 1) as usize];
            row.payment += entry.payment;
            row.principal += entry.principal;
            row.interest += entry.interest;
            row.balance += entry.balance;
        }
    }

    let cards = accounts
        .iter()
        .zip(schedules)
        .map(|(account, schedule)| AccountSummary {
            name: account.name.clone(),
            starting_balance: account.balance,
            payoff_period: Some(schedule.as_ref().map(|s| s.periods).unwrap_or(0)),
            total_interest: schedule.as_ref().map(|s| s.total_interest).unwrap_or(0.0),
            total_paid: schedule.as_ref().map(|s| s.total_paid).unwrap_or(0.0),
        })
        .collect::<Vec<_>>();

    Output {
        strategy,
        months,
        starting_balance: accounts.iter().map(|a| a.balance).sum(),
        total_paid: cards.iter().map(|c| c.total_paid).sum(),
        total_interest: cards.iter().map(|c| c.total_interest).sum(),
        cards,
        schedule: rows,
        comparison: None,
    }
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

    fn card(name: &str, balance: f64, apr: f64, minimum: f64) -> CardInput {
        CardInput {
            name: Some(name.to_string()),
            balance,
            apr,
            minimum_payment: Some(minimum),
        }
    }

    fn input(cards: Vec<CardInput>, strategy: Strategy, monthly_payment: Option<f64>) -> Input {
        Input {
            cards,
            balance: None,
            apr: None,
            minimum_payment: None,
            strategy,
            monthly_payment,
            minimum_percent: 2.0,
            minimum_floor: 25.0,
        }
    }

    #[test]
    fn single_flat_card_with_fixed_payment() {
        let mut i = input(Vec::new(), Strategy::Fixed, Some(200.0));
        i.balance = Some(5_000.0);
        i.apr = Some(18.99);
        let out = calculate(&i).expect("valid");
        assert_eq!(out.cards.len(), 1);
        assert_eq!(out.cards[0].name, "Card 1");
        assert_eq!(out.months, out.schedule.len() as u32);
        assert!(out.months > 24 && out.months < 40);
        assert_close(out.total_paid, out.starting_balance + out.total_interest, 0.02);
        assert!(out.comparison.is_none());
    }

    #[test]
    fn avalanche_beats_snowball_on_interest() {
        let cards = vec![
            card("store", 900.0, 26.99, 30.0),
            card("travel", 6_500.0, 21.49, 130.0),
            card("cashback", 2_200.0, 15.24, 45.0),
        ];
        let out = calculate(&input(cards, Strategy::Avalanche, Some(500.0))).expect("valid");
        let comparison = out.comparison.expect("comparison for multiple cards");
        let avalanche = comparison
            .iter()
            .find(|c| c.strategy == Strategy::Avalanche)
            .expect("avalanche row");
        let snowball = comparison
            .iter()
            .find(|c| c.strategy == Strategy::Snowball)
            .expect("snowball row");
        let avalanche_interest = avalanche.total_interest.expect("avalanche pays off");
        assert!(avalanche_interest <= snowball.total_interest.expect("snowball pays off"));
        assert_close(avalanche_interest, out.total_interest, 1e-9);
        assert!(comparison.iter().all(|c| c.error.is_none()));
    }

    #[test]
    fn minimum_strategy_takes_longer_than_budgeted_payoff() {
        let cards = vec![card("a", 3_000.0, 19.99, 60.0)];
        let minimum = calculate(&input(cards.clone(), Strategy::Minimum, None)).expect("valid");
        let fixed = calculate(&input(cards, Strategy::Fixed, Some(300.0))).expect("valid");
        assert!(minimum.months > fixed.months);
        assert!(minimum.total_interest > fixed.total_interest);
    }

    #[test]
    fn failing_comparison_strategy_keeps_its_row() {
        let cards = vec![card("zero", 1_000.0, 0.0, 10.0), card("steep", 1_000.0, 30.0, 10.0)];
        let out = calculate(&input(cards, Strategy::Avalanche, Some(40.0))).expect("valid");
        let comparison = out.comparison.expect("comparison for multiple cards");
        assert_eq!(comparison.len(), 3);
        let avalanche = comparison
            .iter()
            .find(|c| c.strategy == Strategy::Avalanche)
            .expect("avalanche row");
        assert_eq!(avalanche.months, Some(out.months));
        let fixed = comparison
            .iter()
            .find(|c| c.strategy == Strategy::Fixed)
            .expect("fixed row");
        assert!(fixed.months.is_none());
        assert!(
            fixed
                .error
                .as_deref()
                .expect("failure reason")
                .contains("never amortizes")
        );
    }

    #[test]
    fn minimum_strategy_honours_card_minimum() {
        let with_own = input(vec![card("flat", 1_000.0, 0.0, 100.0)], Strategy::Minimum, None);
        let out = calculate(&with_own).expect("valid");
        assert_eq!(out.months, 10);
        assert_close(out.schedule[0].payment, 100.0, 1e-9);

        let mut derived = input(Vec::new(), Strategy::Minimum, None);
        derived.balance = Some(1_000.0);
        derived.apr = Some(0.0);
        let out = calculate(&derived).expect("valid");
        assert_close(out.schedule[0].payment, 25.0, 1e-9);
    }

    #[test]
    fn fixed_budget_is_split_by_balance() {
        let cards = vec![card("a", 1_000.0, 12.0, 25.0), card("b", 3_000.0, 12.0, 25.0)];
        let out = calculate(&input(cards, Strategy::Fixed, Some(400.0))).expect("valid");
        assert_close(out.schedule[0].payment, 400.0, 1e-9);
        assert_eq!(out.cards[0].payoff_period, out.cards[1].payoff_period);
    }

    #[test]
    fn interest_only_budget_is_non_amortizing() {
        let mut i = input(Vec::new(), Strategy::Fixed, Some(50.0));
        i.balance = Some(5_000.0);
        i.apr = Some(12.0);
        assert!(matches!(
            calculate(&i),
            Err(CalcError::NonAmortizing { period: 1, .. })
        ));
    }

    #[test]
    fn budget_strategies_require_monthly_payment() {
        let cards = vec![card("a", 1_000.0, 20.0, 25.0)];
        let err = calculate(&input(cards, Strategy::Snowball, None)).expect_err("must reject");
        assert_eq!(err.field(), Some("monthlyPayment"));
    }

    #[test]
    fn derived_minimum_uses_percent_and_floor() {
        let mut i = input(Vec::new(), Strategy::Avalanche, Some(25.0));
        i.balance = Some(800.0);
        i.apr = Some(0.0);
        let out = calculate(&i).expect("valid");
        assert_eq!(out.months, 32);
        assert_close(out.total_interest, 0.0, 1e-12);
    }

    #[test]
    fn balance_without_apr_is_rejected() {
        let mut i = input(Vec::new(), Strategy::Fixed, Some(100.0));
        i.balance = Some(800.0);
        assert_eq!(calculate(&i).expect_err("must reject").field(), Some("apr"));
    }
}
