//! # quotedesk-core: Quote Pricing & Lifecycle Engine
//!
//! Pure business logic for B2B quotes: line item pricing, aggregate totals,
//! the status workflow and expiry arithmetic. No I/O, no logging, no clock.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Quotedesk Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   Creation / edit wizards   Detail view   Emails   Expiry job  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │   quotedesk-service: per-quote locks, audit log, sweep, tracing │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ quotedesk-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pricing  │  │ workflow  │  │   quote   │  │ template  │  │   │
//! │  │   │ line item │  │  table    │  │  Quote    │  │  email    │  │   │
//! │  │   │  totals   │  │  expiry   │  │  edits    │  │  context  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   money · types · validation · error · clock                   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO LOGGING • "now" IS ALWAYS A PARAMETER             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Exact decimal Money, Percentage, Currency
//! - [`types`] - QuoteStatus, LineItem, Discount, terms, totals, audit record
//! - [`quote`] - The Quote aggregate and its guarded edits
//! - [`pricing`] - Line item and quote total recomputation
//! - [`workflow`] - Transition table, available actions, expiry, replay
//! - [`template`] - Email template variables
//! - [`clock`] - Clock trait for orchestrators
//! - [`validation`] - Field validators
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output; recompute is idempotent
//! 2. **Exact Money**: `rust_decimal`, never floats; rounding only for display
//! 3. **Table-Driven Workflow**: one static list of legal transitions
//! 4. **Explicit Errors**: typed errors, never clamping, never panics
//!
//! ## Example Usage
//!
//! ```rust
//! use quotedesk_core::money::{Money, Percentage};
//! use quotedesk_core::pricing::recompute_quote_totals;
//! use quotedesk_core::types::{Discount, LineItem};
//! use rust_decimal::Decimal;
//!
//! let item = LineItem::new(
//!     "Implementation services",
//!     2,
//!     Money::new(Decimal::new(5000, 0)),
//!     Percentage::new(Decimal::new(5, 0)).map(Discount::Percentage),
//!     Percentage::new(Decimal::new(85, 1)).unwrap(),
//! );
//!
//! let totals = recompute_quote_totals(&[item], Money::zero()).unwrap();
//! assert_eq!(totals.total.amount(), Decimal::new(103075, 1)); // 10307.5
//! ```

use rust_decimal::Decimal;

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod error;
pub mod money;
pub mod pricing;
pub mod quote;
pub mod template;
pub mod types;
pub mod validation;
pub mod workflow;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, ValidationError, ValidationResult};
pub use money::{Currency, Money, Percentage};
pub use quote::Quote;
pub use template::QuoteEmailContext;
pub use types::*;
pub use workflow::{ExpiryState, StatusAction};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Actor id recorded for automated transitions (expiry sweep, conversion).
pub const SYSTEM_ACTOR_ID: &str = "system";

/// Validity window applied when no terms are supplied.
pub const DEFAULT_VALIDITY_DAYS: u32 = 30;

/// Maximum quantity on a single line.
///
/// ## Business Reason
/// Catches a mistyped quantity before it lands on a customer document.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000_000;

/// Maximum unit price, absolute discount or shipping amount (1e12).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Maximum line items on one quote.
pub const MAX_LINE_ITEMS: usize = 500;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_amount_is_one_trillion() {
        assert_eq!(MAX_AMOUNT, Decimal::new(1_000_000_000_000, 0));
    }
}
