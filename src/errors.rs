use thiserror::Error;

use crate::decimal::{Money, Rate};

#[derive(Error, Debug)]
pub enum InterestError {
    #[error("assignment amount {assigned} exceeds unassigned payment amount {available}")]
    AssignmentExceedsUnassigned {
        assigned: Money,
        available: Money,
    },

    #[error("assignment amount {assigned} exceeds invoice balance {balance}")]
    AssignmentExceedsBalance {
        assigned: Money,
        balance: Money,
    },

    #[error("invalid assignment amount: {amount}")]
    InvalidAssignmentAmount {
        amount: Money,
    },

    #[error("assignment {index} not found on payment {payment_id}")]
    AssignmentNotFound {
        payment_id: String,
        index: usize,
    },

    #[error("malformed {record} record: field `{field}` {message}")]
    MalformedInput {
        record: String,
        field: String,
        message: String,
    },

    #[error("invalid date in `{field}`: {value:?} is not YYYY-MM-DD")]
    InvalidDate {
        field: String,
        value: String,
    },

    #[error("invoice not found: {id}")]
    InvoiceNotFound {
        id: String,
    },

    #[error("payment not found: {id}")]
    PaymentNotFound {
        id: String,
    },

    #[error("invalid interest rate: {rate}")]
    InvalidInterestRate {
        rate: Rate,
    },

    #[error("calculation overflow: {context}")]
    CalculationOverflow {
        context: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl InterestError {
    /// rejected bookkeeping mutation; stored state must stay untouched
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            InterestError::AssignmentExceedsUnassigned { .. }
                | InterestError::AssignmentExceedsBalance { .. }
                | InterestError::InvalidAssignmentAmount { .. }
                | InterestError::AssignmentNotFound { .. }
        )
    }

    /// input that failed to parse or is missing required data
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            InterestError::MalformedInput { .. }
                | InterestError::InvalidDate { .. }
                | InterestError::Serialization(_)
        )
    }

    pub(crate) fn malformed(record: &str, field: &str, message: impl Into<String>) -> Self {
        InterestError::MalformedInput {
            record: record.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InterestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_carries_amounts() {
        let err = InterestError::AssignmentExceedsUnassigned {
            assigned: Money::from_major(500),
            available: Money::from_minor(25_050),
        };
        assert!(err.is_validation());
        assert!(!err.is_malformed_input());
        assert_eq!(
            err.to_string(),
            "assignment amount 500 exceeds unassigned payment amount 250.50"
        );
    }

    #[test]
    fn test_malformed_input_names_field() {
        let err = InterestError::malformed("invoice INV-001", "amount", "must not be negative");
        assert!(err.is_malformed_input());
        assert_eq!(
            err.to_string(),
            "malformed invoice INV-001 record: field `amount` must not be negative"
        );

        let err = InterestError::InvalidDate {
            field: "date".to_string(),
            value: "2023-13-01".to_string(),
        };
        assert!(err.is_malformed_input());
        assert!(err.to_string().contains("\"2023-13-01\""));
    }

    #[test]
    fn test_overflow_is_neither_validation_nor_malformed() {
        let err = InterestError::CalculationOverflow {
            context: "invoice INV-1 total interest".to_string(),
        };
        assert!(!err.is_validation());
        assert!(!err.is_malformed_input());
        assert_eq!(err.to_string(), "calculation overflow: invoice INV-1 total interest");
    }
}
