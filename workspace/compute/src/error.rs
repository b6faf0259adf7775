use rust_decimal::Decimal;
use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Malformed input: bad amount, inverted date range, missing field
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity is absent or not owned by the caller
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write rejected because it would break an invariant (overlapping budget, category in use)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Error from date operations
    #[error("Date error: {0}")]
    Date(String),

    /// Runtime error for unexpected situations
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl ComputeError {
    /// Stable machine readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ComputeError::Validation(_) => "VALIDATION_ERROR",
            ComputeError::NotFound(_) => "NOT_FOUND",
            ComputeError::Conflict(_) => "CONFLICT",
            ComputeError::Database(_) | ComputeError::Date(_) | ComputeError::Runtime(_) => {
                "INTERNAL_ERROR"
            }
        }
    }

    /// True for errors caused by storage or the runtime rather than by the request.
    pub fn is_internal(&self) -> bool {
        self.code() == "INTERNAL_ERROR"
    }
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;

/// Sums amounts, failing with `Runtime` instead of panicking on overflow.
pub fn sum_amounts<I>(amounts: I, context: &str) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    common::checked_total(amounts)
        .ok_or_else(|| ComputeError::Runtime(format!("Amount overflow while totalling {}", context)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_amounts_overflow_is_runtime_error() {
        let huge = Decimal::MAX / Decimal::TWO + Decimal::ONE;

        let err = sum_amounts([huge, huge, huge], "spending").unwrap_err();
        assert!(matches!(err, ComputeError::Runtime(_)));
        assert!(err.is_internal());
        assert!(err.to_string().contains("spending"));
    }

    #[test]
    fn test_sum_amounts() {
        let total = sum_amounts([Decimal::new(1050, 2), Decimal::new(250, 2)], "spending").unwrap();
        assert_eq!(total, Decimal::new(1300, 2));
    }
}
