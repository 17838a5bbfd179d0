//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

/// Business rule violations and domain invariant failures.
///
/// These are independent of the web/infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Plan identifier missing from the catalog
    #[error("Unknown plan: {0}")]
    UnknownPlan(String),

    /// Payment would overshoot the plan total, or the student is already paid up
    #[error("Overpayment rejected: attempted {attempted}, outstanding balance {balance}")]
    OverpaymentRejected { attempted: Decimal, balance: Decimal },

    /// Invalid amount (zero, negative, too precise, too large)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Input failed validation
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// Stored record cannot be reconciled into a valid student
    #[error("Corrupt student record {id}: {reason}")]
    CorruptRecord { id: String, reason: String },
}

impl DomainError {
    pub fn overpayment(attempted: Decimal, balance: Decimal) -> Self {
        Self::OverpaymentRejected { attempted, balance }
    }

    pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Check if this is a client error (caller can correct the request)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownPlan(_)
                | Self::OverpaymentRejected { .. }
                | Self::InvalidAmount(_)
                | Self::InvalidInput { .. }
        )
    }
}

impl From<super::AmountError> for DomainError {
    fn from(err: super::AmountError) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_overpayment_error_carries_balance() {
        let err = DomainError::overpayment(dec!(100), dec!(0));

        assert!(err.is_client_error());
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("balance 0"));
    }

    #[test]
    fn test_corrupt_record_is_not_client_error() {
        let err = DomainError::CorruptRecord {
            id: "abc".to_string(),
            reason: "overpaid".to_string(),
        };

        assert!(!err.is_client_error());
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_amount_error_conversion() {
        let err: DomainError = super::super::AmountError::NotPositive(dec!(0)).into();
        assert!(matches!(err, DomainError::InvalidAmount(_)));
    }
}
