//! # Error Types
//!
//! Domain-specific error types for voz-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  voz-core errors (this file)                                            │
//! │  ├── RejectReason     - Why an extraction was refused (never persisted) │
//! │  └── ValidationError  - Input validation failures (edits, fields)       │
//! │                                                                         │
//! │  voz-db errors (separate crate)                                         │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  voz-oracle errors (separate crate)                                     │
//! │  └── OracleError      - Transport and parse failures at the LLM seam    │
//! │                                                                         │
//! │  voz-engine errors (separate crate)                                     │
//! │  └── EngineError      - Turn-level taxonomy the caller dispatches on    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (amounts, indexes)
//! 3. Errors are enum variants, never String
//! 4. A rejection is a final answer for the turn - nothing is coerced,
//!    re-summed, or retried to make bad data fit

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Extraction Rejection
// =============================================================================

/// Why a structurally-present oracle reply was refused by the validator.
///
/// A rejected extraction is reported to the caller as "no transaction
/// recognized" and is never persisted. The variants exist so the caller can
/// decide what clarifying question to ask.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RejectReason {
    /// The oracle judged the utterance to be a question, hypothetical, or
    /// request for help - not sale data. That judgment is the oracle's;
    /// the validator does not re-derive it.
    #[error("No sale data in utterance")]
    NoSaleData,

    /// Sale data declared but zero line items present.
    #[error("Sale has no line items")]
    NoLineItems,

    /// A line item failed a field rule (quantity > 0, price > 0,
    /// non-empty name). Index is zero-based into the oracle's item list.
    #[error("Invalid line item {index}: {field}")]
    InvalidLineItem { index: usize, field: String },

    /// Declared total missing or not positive.
    #[error("Invalid total amount")]
    TotalNotPositive,

    /// Declared total does not equal the sum of line-item subtotals
    /// (exact cents comparison after normalization).
    #[error("Invalid total amount: declared {declared_cents} but items sum to {computed_cents}")]
    TotalMismatch {
        declared_cents: i64,
        computed_cents: i64,
    },

    /// A declared payment amount is not positive.
    #[error("Invalid payment amount at index {index}")]
    PaymentNotPositive { index: usize },

    /// Declared payment amounts do not sum to the declared total.
    /// Split-payment phrases must already be expanded by the oracle.
    #[error("Payments sum to {payments_cents} but total is {total_cents}")]
    PaymentSumMismatch {
        total_cents: i64,
        payments_cents: i64,
    },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors for caller-supplied values (edit field sets,
/// identifiers). Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: &'static str },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: &'static str },

    /// An edit request declared no fields at all.
    #[error("at least one field must be supplied")]
    EmptyUpdate,

    /// Invalid format (e.g. malformed UUID).
    #[error("{field} has invalid format")]
    InvalidFormat { field: &'static str },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_reason_messages() {
        let err = RejectReason::TotalMismatch {
            declared_cents: 15000,
            computed_cents: 14000,
        };
        assert_eq!(
            err.to_string(),
            "Invalid total amount: declared 15000 but items sum to 14000"
        );

        assert_eq!(RejectReason::NoSaleData.to_string(), "No sale data in utterance");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required { field: "name" };
        assert_eq!(err.to_string(), "name is required");

        assert_eq!(
            ValidationError::EmptyUpdate.to_string(),
            "at least one field must be supplied"
        );
    }

    #[test]
    fn test_reject_reason_round_trips_as_json() {
        let err = RejectReason::PaymentSumMismatch {
            total_cents: 10000,
            payments_cents: 9000,
        };
        let json = serde_json::to_string(&err).unwrap();
        let back: RejectReason = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
