use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("non-finite value in `{field}` for {asin}")]
    NonFiniteInput { asin: String, field: &'static str },
    #[error("negative value in `{field}` for {asin}")]
    NegativeInput { asin: String, field: &'static str },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("input failure: {0}")]
    Input(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl AnalyticsError {
    /// Stable class name used by callers when reporting failures.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::NonFiniteInput { .. })
            | Self::Domain(DomainError::NegativeInput { .. }) => "invalid_input",
            Self::Domain(DomainError::InvariantViolation(_)) => "invariant_violation",
            Self::Input(_) => "input",
            Self::Configuration(_) => "config_validation",
        }
    }
}

/// Rejects NaN/Infinity in a numeric input field.
pub fn ensure_finite(asin: &str, field: &'static str, value: f64) -> Result<f64, DomainError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DomainError::NonFiniteInput { asin: asin.to_string(), field })
    }
}
