use serde::{Deserialize, Serialize};

use crate::core::engine::{
    AmortizationInputs, PaymentRule, amortize, annuity_payment, monthly_rate,
};
use crate::core::error::{CalcError, ensure_non_negative, ensure_positive, ensure_range};

pub const APR_TO_MONEY_FACTOR: f64 = 2400.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recommendation {
    Lease,
    Buy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub msrp: f64,
    pub negotiated_price: Option<f64>,
    #[serde(default)]
    pub down_payment: f64,
    pub residual_percent: f64,
    pub money_factor: Option<f64>,
    pub lease_apr: Option<f64>,
    pub term_months: u32,
    #[serde(default)]
    pub sales_tax_percent: f64,
    #[serde(default)]
    pub acquisition_fee: f64,
    #[serde(default)]
    pub disposition_fee: f64,
    #[serde(default)]
    pub loan_apr: f64,
    #[serde(default = "default_loan_term")]
    pub loan_term_months: u32,
    pub expected_value_percent: Option<f64>,
}

fn default_loan_term() -> u32 {
    60
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseSide {
    pub money_factor: f64,
    pub equivalent_apr: f64,
    pub capitalized_cost: f64,
    pub residual_value: f64,
    pub depreciation: f64,
    pub finance_charge: f64,
    pub base_payment: f64,
    pub tax: f64,
    pub monthly_payment: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuySide {
    pub loan_amount: f64,
    pub monthly_payment: f64,
    pub paid_during_term: f64,
    pub interest_during_term: f64,
    pub remaining_balance: f64,
    pub expected_value: f64,
    pub equity: f64,
    pub net_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub term_months: u32,
    pub lease: LeaseSide,
    pub buy: BuySide,
    pub recommendation: Recommendation,
    pub savings: f64,
}

fn validate(input: &Input) -> Result<(), CalcError> {
    ensure_positive("msrp", input.msrp)?;
    if let Some(price) = input.negotiated_price {
        ensure_positive("negotiatedPrice", price)?;
    }
    ensure_non_negative("downPayment", input.down_payment)?;
    ensure_range("residualPercent", input.residual_percent, 0.0, 100.0)?;
    if input.term_months == 0 || input.term_months > 120 {
        return Err(CalcError::invalid("termMonths", "must be between 1 and 120"));
    }
    if input.loan_term_months == 0 || input.loan_term_months > 120 {
        return Err(CalcError::invalid(
            "loanTermMonths",
            "must be between 1 and 120",
        ));
    }
    ensure_range("salesTaxPercent", input.sales_tax_percent, 0.0, 25.0)?;
    ensure_non_negative("acquisitionFee", input.acquisition_fee)?;
    ensure_non_negative("dispositionFee", input.disposition_fee)?;
    ensure_range("loanApr", input.loan_apr, 0.0, 40.0)?;
    if let Some(pct) = input.expected_value_percent {
        ensure_range("expectedValuePercent", pct, 0.0, 100.0)?;
    }
    Ok(())
}

fn resolve_money_factor(input: &Input) -> Result<f64, CalcError> {
    match (input.money_factor, input.lease_apr) {
        (Some(mf), _) => {
            ensure_range("moneyFactor", mf, 0.0, 0.02)?;
            Ok(mf)
        }
        (None, Some(apr)) => {
            ensure_range("leaseApr", apr, 0.0, 40.0)?;
            Ok(apr / APR_TO_MONEY_FACTOR)
        }
        (None, None) => Err(CalcError::invalid(
            "moneyFactor",
            "either moneyFactor or leaseApr is required",
        )),
    }
}

fn lease_side(input: &Input, price: f64, money_factor: f64) -> Result<LeaseSide, CalcError> {
    let term = input.term_months as f64;
    let capitalized_cost = price + input.acquisition_fee - input.down_payment;
    let residual_value = input.msrp * input.residual_percent / 100.0;
    if capitalized_cost < residual_value {
        return Err(CalcError::invalid(
            "downPayment",
            "capitalized cost cannot fall below the residual value",
        ));
    }

    let depreciation = (capitalized_cost - residual_value) / term;
    let finance_charge = (capitalized_cost + residual_value) * money_factor;
    let base_payment = depreciation + finance_charge;
    let tax = base_payment * input.sales_tax_percent / 100.0;
    let monthly_payment = base_payment + tax;

    Ok(LeaseSide {
        money_factor,
        equivalent_apr: money_factor * APR_TO_MONEY_FACTOR,
        capitalized_cost,
        residual_value,
        depreciation,
        finance_charge,
        base_payment,
        tax,
        monthly_payment,
        total_cost: input.down_payment + monthly_payment * term + input.disposition_fee,
    })
}

fn buy_side(input: &Input, price: f64) -> Result<BuySide, CalcError> {
    let taxed_price = price * (1.0 + input.sales_tax_percent / 100.0);
    let loan_amount = taxed_price - input.down_payment;
    // Cash beyond the taxed price is not spent on the car.
    let cash_paid = input.down_payment.min(taxed_price);
    let expected_value = input.msrp
        * input
            .expected_value_percent
            .unwrap_or(input.residual_percent)
        / 100.0;

    let (monthly_payment, paid_during_term, interest_during_term, remaining_balance) =
        if loan_amount > 0.0 {
            let rate = monthly_rate(input.loan_apr);
            let payment = annuity_payment(loan_amount, rate, input.loan_term_months);
            let schedule = amortize(&AmortizationInputs {
                starting_balance: loan_amount,
                periodic_rate: rate,
                payment_rule: PaymentRule::Fixed { payment },
                cap_periods: input.loan_term_months + 1,
            })?;
            let interest = schedule
                .entries
                .iter()
                .take_while(|e| e.period <= input.term_months)
                .map(|e| e.interest)
                .sum();
            (
                payment,
                schedule.paid_through(input.term_months),
                interest,
                schedule.balance_after(input.term_months),
            )
        } else {
            (0.0, 0.0, 0.0, 0.0)
        };

    let equity = expected_value - remaining_balance;
    Ok(BuySide {
        loan_amount: loan_amount.max(0.0),
        monthly_payment,
        paid_during_term,
        interest_during_term,
        remaining_balance,
        expected_value,
        equity,
        net_cost: cash_paid + paid_during_term - equity,
    })
}

pub fn calculate(input: &Input) -> Result<Output, CalcError> {
    validate(input)?;
    let money_factor = resolve_money_factor(input)?;
    let price = input.negotiated_price.unwrap_or(input.msrp);

    let lease = lease_side(input, price, money_factor)?;
    let buy = buy_side(input, price)?;

    let (recommendation, savings) = if lease.total_cost <= buy.net_cost {
        (Recommendation::Lease, buy.net_cost - lease.total_cost)
    } else {
        (Recommendation::Buy, lease.total_cost - buy.net_cost)
    };

    Ok(Output {
        term_months: input.term_months,
        lease,
        buy,
        recommendation,
        savings,
    })
}
