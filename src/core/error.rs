use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("{field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },

    #[error("invalid input payload: {0}")]
    Payload(String),

    #[error(
        "payment of {payment:.2} does not cover interest of {interest:.2} in period {period}; the balance never amortizes"
    )]
    NonAmortizing {
        period: u32,
        payment: f64,
        interest: f64,
    },

    #[error("balance of {remaining_balance:.2} still outstanding after {periods} periods")]
    HorizonExceeded { periods: u32, remaining_balance: f64 },

    #[error("unknown calculator '{0}'")]
    UnknownCalculator(String),
}

impl CalcError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }

    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Invalid { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<(), CalcError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CalcError::invalid(field, "must be a finite number"))
    }
}

pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<(), CalcError> {
    ensure_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(CalcError::invalid(field, "must be > 0"))
    }
}

pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<(), CalcError> {
    ensure_finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(CalcError::invalid(field, "must be >= 0"))
    }
}

pub(crate) fn ensure_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), CalcError> {
    ensure_finite(field, value)?;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(CalcError::invalid(
            field,
            format!("must be between {min} and {max}"),
        ))
    }
}
