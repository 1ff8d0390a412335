//! # Error Types
//!
//! Domain-specific error types for quotedesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  quotedesk-core errors (this file)                                     │
//! │  ├── CoreError        - Workflow errors (transition, editability)      │
//! │  └── ValidationError  - Malformed pricing / quote input                │
//! │                                                                         │
//! │  quotedesk-service errors (separate crate)                             │
//! │  └── ServiceError     - Lookup, version conflicts, wraps CoreError     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never retries, logs, or suppresses an error. Every failure is
//! a rejected function call and the caller decides what the user sees.

use thiserror::Error;

use crate::money::Money;
use crate::types::QuoteStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised by the status workflow and quote-level rules.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The requested status change is not an edge of the transition table.
    ///
    /// ## User Workflow
    /// ```text
    /// Detail view renders "Mark Accepted" (quote is SENT)
    ///      │
    ///      ▼
    /// Another user already marked it REJECTED
    ///      │
    ///      ▼
    /// apply_transition(REJECTED → ACCEPTED)
    ///      │
    ///      ▼
    /// InvalidTransition { from: REJECTED, to: ACCEPTED }
    ///      │
    ///      ▼
    /// UI re-renders available actions (no retry)
    /// ```
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: QuoteStatus, to: QuoteStatus },

    /// An edit was attempted on a quote that is no longer editable.
    ///
    /// Only DRAFT and PENDING quotes accept line item or terms changes.
    #[error("Quote {quote_id} is {status} and cannot be edited")]
    NotEditable { quote_id: String, status: QuoteStatus },

    /// Line item id not present on the quote.
    #[error("Line item {line_item_id} not found on quote {quote_id}")]
    LineItemNotFound {
        quote_id: String,
        line_item_id: String,
    },

    /// The status history does not chain into a consistent sequence.
    #[error("Status history broken at record {index}: expected from {expected}, found {found}")]
    HistoryMismatch {
        index: usize,
        expected: QuoteStatus,
        found: QuoteStatus,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Never silently clamped: a clamped discount or price would hide a data
/// entry mistake in a financial document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., currency code, quote number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Both a discount percentage and a discount amount were supplied.
    #[error("discount must be either a percentage or an amount, not both")]
    ConflictingDiscount,

    /// An absolute discount is larger than the line subtotal.
    #[error("discount {discount} exceeds line subtotal {subtotal}")]
    DiscountExceedsSubtotal { discount: Money, subtotal: Money },
}

impl ValidationError {
    /// Creates an OutOfRange error from any displayable bounds.
    pub fn out_of_range(
        field: impl Into<String>,
        min: impl ToString,
        max: impl ToString,
    ) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    /// Creates a MustBeNonNegative error.
    pub fn negative(field: impl Into<String>) -> Self {
        ValidationError::MustBeNonNegative {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidTransition {
            from: QuoteStatus::Accepted,
            to: QuoteStatus::Sent,
        };
        assert_eq!(
            err.to_string(),
            "Invalid status transition from ACCEPTED to SENT"
        );

        let err = CoreError::NotEditable {
            quote_id: "q-1".to_string(),
            status: QuoteStatus::Sent,
        };
        assert_eq!(err.to_string(), "Quote q-1 is SENT and cannot be edited");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::out_of_range("taxRate", 0, 100);
        assert_eq!(err.to_string(), "taxRate must be between 0 and 100");

        let err = ValidationError::DiscountExceedsSubtotal {
            discount: Money::new(dec!(150)),
            subtotal: Money::new(dec!(100)),
        };
        assert_eq!(err.to_string(), "discount 150 exceeds line subtotal 100");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::negative("quantity").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
