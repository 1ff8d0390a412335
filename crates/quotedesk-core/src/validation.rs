//! # Validation Module
//!
//! Field-level validators for pricing inputs and quote attributes.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Wizard forms (frontend)                                      │
//! │  └── Immediate feedback while typing                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Type construction (LineItemInput → LineItem, Percentage)     │
//! │  └── Ranges that can be checked without context                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Pricing recompute (THIS MODULE is called from there)         │
//! │  ├── Non-negative quantity / price                                     │
//! │  └── Absolute discount ≤ subtotal                                      │
//! │                                                                         │
//! │  Errors are returned, never clamped.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use quotedesk_core::validation::{validate_quantity, validate_quote_number};
//!
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_quantity(-1).is_err());
//! assert!(validate_quote_number("Q-2024-0001").is_ok());
//! ```

use rust_decimal::Decimal;

use crate::error::{ValidationError, ValidationResult};
use crate::money::{Money, Percentage};
use crate::types::QuoteTerms;
use crate::{MAX_AMOUNT, MAX_LINE_QUANTITY};

/// Longest quote number accepted.
const MAX_QUOTE_NUMBER_LEN: usize = 32;

/// Longest line item description accepted.
const MAX_DESCRIPTION_LEN: usize = 500;

/// Longest validity window in days.
const MAX_VALIDITY_DAYS: u32 = 365;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be non-negative (zero is a placeholder row, allowed)
/// - Must not exceed [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::negative("quantity"));
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::out_of_range(
            "quantity",
            0,
            MAX_LINE_QUANTITY,
        ));
    }

    Ok(())
}

/// Validates a money input (unit price, shipping, absolute discount).
///
/// ## Rules
/// - Must be non-negative (zero is allowed: free items, free shipping)
/// - Must not exceed [`MAX_AMOUNT`]
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::negative(field));
    }

    if amount.amount() > MAX_AMOUNT {
        return Err(ValidationError::out_of_range(field, 0, MAX_AMOUNT));
    }

    Ok(())
}

/// Validates a raw percentage and converts it.
///
/// ## Example
/// ```rust
/// use quotedesk_core::validation::validate_percentage;
/// use rust_decimal::Decimal;
///
/// assert!(validate_percentage("taxRate", Decimal::new(85, 1)).is_ok());
/// assert!(validate_percentage("taxRate", Decimal::new(-1, 0)).is_err());
/// ```
pub fn validate_percentage(field: &str, value: Decimal) -> ValidationResult<Percentage> {
    Percentage::new(value).ok_or_else(|| ValidationError::out_of_range(field, 0, 100))
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a human-readable quote number.
///
/// ## Rules
/// - Must not be empty
/// - At most 32 characters
/// - Letters, digits, hyphens and underscores only
pub fn validate_quote_number(number: &str) -> ValidationResult<()> {
    let number = number.trim();

    if number.is_empty() {
        return Err(ValidationError::Required {
            field: "quoteNumber".to_string(),
        });
    }

    if number.len() > MAX_QUOTE_NUMBER_LEN {
        return Err(ValidationError::TooLong {
            field: "quoteNumber".to_string(),
            max: MAX_QUOTE_NUMBER_LEN,
        });
    }

    if !number
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "quoteNumber".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates the customer a quote is addressed to.
pub fn validate_customer_id(customer_id: &str) -> ValidationResult<()> {
    if customer_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "customerId".to_string(),
        });
    }

    Ok(())
}

/// Validates a line item description (may be empty).
pub fn validate_description(description: &str) -> ValidationResult<()> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Terms Validators
// =============================================================================

/// Validates a quote's validity period.
pub fn validate_validity_days(days: u32) -> ValidationResult<()> {
    if days == 0 || days > MAX_VALIDITY_DAYS {
        return Err(ValidationError::out_of_range(
            "validityDays",
            1,
            MAX_VALIDITY_DAYS,
        ));
    }

    Ok(())
}

/// Validates quote terms as a whole.
///
/// ## Rules
/// - Validity period within 1..=365 days
/// - A deposit percentage is required when a deposit is required, and must
///   be absent otherwise
pub fn validate_terms(terms: &QuoteTerms) -> ValidationResult<()> {
    validate_validity_days(terms.validity_days)?;

    match (terms.deposit_required, terms.deposit_percentage) {
        (true, None) => Err(ValidationError::Required {
            field: "depositPercentage".to_string(),
        }),
        (false, Some(_)) => Err(ValidationError::InvalidFormat {
            field: "depositPercentage".to_string(),
            reason: "set only when a deposit is required".to_string(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(0).is_ok());
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());

        assert_eq!(
            validate_quantity(-1),
            Err(ValidationError::negative("quantity"))
        );
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("unitPrice", Money::zero()).is_ok());
        assert!(validate_amount("unitPrice", Money::new(dec!(5000))).is_ok());
        assert_eq!(
            validate_amount("unitPrice", Money::new(dec!(-0.01))),
            Err(ValidationError::negative("unitPrice"))
        );
        assert!(validate_amount("unitPrice", Money::new(MAX_AMOUNT + dec!(1))).is_err());
    }

    #[test]
    fn test_validate_percentage() {
        assert_eq!(
            validate_percentage("taxRate", dec!(100)).unwrap().value(),
            dec!(100)
        );
        assert!(validate_percentage("taxRate", dec!(100.0001)).is_err());
    }

    #[test]
    fn test_validate_quote_number() {
        assert!(validate_quote_number("Q-000001").is_ok());
        assert!(validate_quote_number("QUOTE_7").is_ok());

        assert!(validate_quote_number("").is_err());
        assert!(validate_quote_number("   ").is_err());
        assert!(validate_quote_number("Q 1").is_err());
        assert!(validate_quote_number(&"Q".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_customer_id() {
        assert!(validate_customer_id("cust-1").is_ok());
        assert_eq!(
            validate_customer_id("  "),
            Err(ValidationError::Required {
                field: "customerId".to_string()
            })
        );
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description("").is_ok());
        assert!(validate_description("Annual support").is_ok());
        assert!(validate_description(&"x".repeat(501)).is_err());
    }

    #[test]
    fn test_validate_terms() {
        let mut terms = QuoteTerms::default();
        assert!(validate_terms(&terms).is_ok());

        terms.validity_days = 0;
        assert!(validate_terms(&terms).is_err());
        terms.validity_days = 366;
        assert!(validate_terms(&terms).is_err());
        terms.validity_days = 14;

        terms.deposit_required = true;
        assert!(validate_terms(&terms).is_err());
        terms.deposit_percentage = Percentage::new(dec!(25));
        assert!(validate_terms(&terms).is_ok());

        terms.deposit_required = false;
        assert!(validate_terms(&terms).is_err());
    }
}
