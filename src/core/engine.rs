use serde::Serialize;

use super::error::CalcError;

pub const MAX_PERIODS: u32 = 600;
pub const PAID_OFF_THRESHOLD: f64 = 0.01;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PaymentRule {
    Fixed { payment: f64 },
    MinimumPercent { percent: f64, floor: f64 },
}

impl PaymentRule {
    fn payment_for(self, balance: f64) -> f64 {
        match self {
            PaymentRule::Fixed { payment } => payment,
            PaymentRule::MinimumPercent { percent, floor } => (balance * percent).max(floor),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayoffOrder {
    Avalanche,
    Snowball,
}

#[derive(Debug, Clone)]
pub struct AmortizationInputs {
    pub starting_balance: f64,
    pub periodic_rate: f64,
    pub payment_rule: PaymentRule,
    pub cap_periods: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub period: u32,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub periods: u32,
    pub total_paid: f64,
    pub total_interest: f64,
    pub total_principal: f64,
    pub entries: Vec<LedgerEntry>,
}

impl Schedule {
    pub fn balance_after(&self, period: u32) -> f64 {
        if period == 0 {
            return self
                .entries
                .first()
                .map(|e| e.balance + e.principal)
                .unwrap_or(0.0);
        }
        self.entries
            .iter()
            .find(|e| e.period == period)
            .map(|e| e.balance)
            .unwrap_or(0.0)
    }

    pub fn paid_through(&self, period: u32) -> f64 {
        self.entries
            .iter()
            .take_while(|e| e.period <= period)
            .map(|e| e.payment)
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub name: String,
    pub balance: f64,
    pub annual_rate_percent: f64,
    pub minimum_payment: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiLedgerEntry {
    pub period: u32,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    pub balance: f64,
    pub balances: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub name: String,
    pub starting_balance: f64,
    pub payoff_period: Option<u32>,
    pub total_interest: f64,
    pub total_paid: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSchedule {
    pub order: PayoffOrder,
    pub periods: u32,
    pub total_paid: f64,
    pub total_interest: f64,
    pub accounts: Vec<AccountSummary>,
    pub entries: Vec<MultiLedgerEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthEntry {
    pub period: u32,
    pub contribution: f64,
    pub interest: f64,
    pub balance: f64,
}

pub fn monthly_rate(annual_percent: f64) -> f64 {
    annual_percent / 100.0 / 12.0
}

pub fn annuity_payment(principal: f64, periodic_rate: f64, periods: u32) -> f64 {
    let n = periods.max(1) as f64;
    if periodic_rate.abs() < 1e-12 {
        return principal / n;
    }
    let growth = (1.0 + periodic_rate).powf(n);
    principal * periodic_rate * growth / (growth - 1.0)
}

pub fn amortize(inputs: &AmortizationInputs) -> Result<Schedule, CalcError> {
    validate_amortization_inputs(inputs)?;

    let mut balance = inputs.starting_balance;
    let mut entries = Vec::new();
    let mut total_paid = 0.0;
    let mut total_interest = 0.0;
    let mut total_principal = 0.0;

    for period in 1..=inputs.cap_periods {
        let interest = balance * inputs.periodic_rate;
        let scheduled = inputs.payment_rule.payment_for(balance);
        let principal = scheduled - interest;
        if principal <= 0.0 {
            tracing::debug!(period, scheduled, interest, "payment does not amortize");
            return Err(CalcError::NonAmortizing {
                period,
                payment: scheduled,
                interest,
            });
        }

        let principal = principal.min(balance);
        let payment = principal + interest;
        balance -= principal;
        if balance <= PAID_OFF_THRESHOLD {
            balance = 0.0;
        }

        total_paid += payment;
        total_interest += interest;
        total_principal += principal;
        entries.push(LedgerEntry {
            period,
            payment,
            principal,
            interest,
            balance,
        });

        if balance == 0.0 {
            tracing::debug!(period, total_interest, "balance paid off");
            return Ok(Schedule {
                periods: period,
                total_paid,
                total_interest,
                total_principal,
                entries,
            });
        }
    }

    Err(CalcError::HorizonExceeded {
        periods: inputs.cap_periods,
        remaining_balance: balance,
    })
}

fn validate_amortization_inputs(inputs: &AmortizationInputs) -> Result<(), CalcError> {
    if !inputs.starting_balance.is_finite() || inputs.starting_balance <= 0.0 {
        return Err(CalcError::invalid("startingBalance", "must be > 0"));
    }
    if !inputs.periodic_rate.is_finite() || inputs.periodic_rate < 0.0 {
        return Err(CalcError::invalid("periodicRate", "must be >= 0"));
    }
    if inputs.cap_periods == 0 || inputs.cap_periods > MAX_PERIODS {
        return Err(CalcError::invalid(
            "capPeriods",
            format!("must be between 1 and {MAX_PERIODS}"),
        ));
    }
    match inputs.payment_rule {
        PaymentRule::Fixed { payment } => {
            if !payment.is_finite() || payment <= 0.0 {
                return Err(CalcError::invalid("payment", "must be > 0"));
            }
        }
        PaymentRule::MinimumPercent { percent, floor } => {
            if !percent.is_finite() || !(0.0..=1.0).contains(&percent) {
                return Err(CalcError::invalid("minimumPercent", "must be between 0 and 100"));
            }
            if !floor.is_finite() || floor < 0.0 {
                return Err(CalcError::invalid("minimumFloor", "must be >= 0"));
            }
            if percent == 0.0 && floor == 0.0 {
                return Err(CalcError::invalid(
                    "minimumPercent",
                    "minimum percent and floor cannot both be zero",
                ));
            }
        }
    }
    Ok(())
}

#[derive(Debug)]
struct OpenAccount {
    balance: f64,
    monthly_rate: f64,
    annual_rate_percent: f64,
    minimum_payment: f64,
    payoff_period: Option<u32>,
    total_interest: f64,
    total_paid: f64,
}

pub fn amortize_accounts(
    accounts: &[Account],
    budget: f64,
    order: PayoffOrder,
    cap_periods: u32,
) -> Result<MultiSchedule, CalcError> {
    validate_accounts(accounts, budget, cap_periods)?;

    let mut open = accounts
        .iter()
        .map(|a| OpenAccount {
            balance: a.balance,
            monthly_rate: monthly_rate(a.annual_rate_percent),
            annual_rate_percent: a.annual_rate_percent,
            minimum_payment: a.minimum_payment,
            payoff_period: if a.balance <= PAID_OFF_THRESHOLD {
                Some(0)
            } else {
                None
            },
            total_interest: 0.0,
            total_paid: 0.0,
        })
        .collect::<Vec<_>>();

    let mut entries = Vec::new();
    let mut total_paid = 0.0;
    let mut total_interest = 0.0;

    for period in 1..=cap_periods {
        let mut period_interest = 0.0;
        let mut owed = vec![0.0; open.len()];
        for (idx, acct) in open.iter_mut().enumerate() {
            if acct.payoff_period.is_some() {
                continue;
            }
            let interest = acct.balance * acct.monthly_rate;
            acct.total_interest += interest;
            period_interest += interest;
            owed[idx] = acct.balance + interest;
        }

        let mut pool = budget;
        let mut paid = vec![0.0; open.len()];
        for (idx, acct) in open.iter().enumerate() {
            if acct.payoff_period.is_some() {
                continue;
            }
            let minimum = acct.minimum_payment.min(owed[idx]).min(pool);
            paid[idx] += minimum;
            pool -= minimum;
        }

        for idx in priority_order(&open, &owed, order) {
            if pool <= 0.0 {
                break;
            }
            let remaining = owed[idx] - paid[idx];
            if remaining <= 0.0 {
                continue;
            }
            let extra = remaining.min(pool);
            paid[idx] += extra;
            pool -= extra;
        }

        let period_payment: f64 = paid.iter().sum();
        let period_principal = period_payment - period_interest;
        if period_principal <= 0.0 {
            tracing::debug!(
                period,
                period_payment,
                period_interest,
                "budget does not amortize accounts"
            );
            return Err(CalcError::NonAmortizing {
                period,
                payment: period_payment,
                interest: period_interest,
            });
        }

        for (idx, acct) in open.iter_mut().enumerate() {
            if acct.payoff_period.is_some() {
                continue;
            }
            acct.balance = owed[idx] - paid[idx];
            acct.total_paid += paid[idx];
            if acct.balance <= PAID_OFF_THRESHOLD {
                acct.balance = 0.0;
                acct.payoff_period = Some(period);
            }
        }

        total_paid += period_payment;
        total_interest += period_interest;
        let balances = open.iter().map(|a| a.balance).collect::<Vec<_>>();
        let balance = balances.iter().sum();
        entries.push(MultiLedgerEntry {
            period,
            payment: period_payment,
            principal: period_principal,
            interest: period_interest,
            balance,
            balances,
        });

        if open.iter().all(|a| a.payoff_period.is_some()) {
            tracing::debug!(period, total_interest, ?order, "all accounts paid off");
            return Ok(MultiSchedule {
                order,
                periods: period,
                total_paid,
                total_interest,
                accounts: accounts
                    .iter()
                    .zip(open.iter())
                    .map(|(input, state)| AccountSummary {
                        name: input.name.clone(),
                        starting_balance: input.balance,
                        payoff_period: state.payoff_period,
                        total_interest: state.total_interest,
                        total_paid: state.total_paid,
                    })
                    .collect(),
                entries,
            });
        }
    }

    Err(CalcError::HorizonExceeded {
        periods: cap_periods,
        remaining_balance: open.iter().map(|a| a.balance).sum(),
    })
}

fn priority_order(open: &[OpenAccount], owed: &[f64], order: PayoffOrder) -> Vec<usize> {
    let mut indices = (0..open.len())
        .filter(|&idx| open[idx].payoff_period.is_none())
        .collect::<Vec<_>>();
    match order {
        PayoffOrder::Avalanche => indices.sort_by(|&a, &b| {
            open[b]
                .annual_rate_percent
                .total_cmp(&open[a].annual_rate_percent)
                .then(owed[b].total_cmp(&owed[a]))
                .then(a.cmp(&b))
        }),
        PayoffOrder::Snowball => indices.sort_by(|&a, &b| {
            owed[a]
                .total_cmp(&owed[b])
                .then(
                    open[b]
                        .annual_rate_percent
                        .total_cmp(&open[a].annual_rate_percent),
                )
                .then(a.cmp(&b))
        }),
    }
    indices
}

fn validate_accounts(accounts: &[Account], budget: f64, cap_periods: u32) -> Result<(), CalcError> {
    if accounts.is_empty() {
        return Err(CalcError::invalid("cards", "at least one account is required"));
    }
    if cap_periods == 0 || cap_periods > MAX_PERIODS {
        return Err(CalcError::invalid(
            "capPeriods",
            format!("must be between 1 and {MAX_PERIODS}"),
        ));
    }
    for account in accounts {
        if !account.balance.is_finite() || account.balance < 0.0 {
            return Err(CalcError::invalid("balance", "must be >= 0"));
        }
        if !account.annual_rate_percent.is_finite() || account.annual_rate_percent < 0.0 {
            return Err(CalcError::invalid("apr", "must be >= 0"));
        }
        if !account.minimum_payment.is_finite() || account.minimum_payment < 0.0 {
            return Err(CalcError::invalid("minimumPayment", "must be >= 0"));
        }
    }
    if accounts.iter().all(|a| a.balance <= PAID_OFF_THRESHOLD) {
        return Err(CalcError::invalid("balance", "at least one balance must be > 0"));
    }
    if !budget.is_finite() || budget <= 0.0 {
        return Err(CalcError::invalid("monthlyPayment", "must be > 0"));
    }
    let minimums: f64 = accounts
        .iter()
        .filter(|a| a.balance > PAID_OFF_THRESHOLD)
        .map(|a| a.minimum_payment)
        .sum();
    if budget + 1e-9 < minimums {
        return Err(CalcError::invalid(
            "monthlyPayment",
            format!("must cover the sum of minimum payments ({minimums:.2})"),
        ));
    }
    Ok(())
}

pub fn project_growth(
    starting_balance: f64,
    periodic_rate: f64,
    periods: u32,
    mut contribution: impl FnMut(u32) -> f64,
) -> Vec<GrowthEntry> {
    let periods = periods.min(MAX_PERIODS);
    let mut balance = starting_balance;
    let mut entries = Vec::with_capacity(periods as usize);
    for period in 1..=periods {
        let interest = balance * periodic_rate;
        let added = contribution(period);
        balance += interest + added;
        entries.push(GrowthEntry {
            period,
            contribution: added,
            interest,
            balance,
        });
    }
    entries
}
