//! # Domain Types
//!
//! Core domain types shared by the pricing calculator and status workflow.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │    LineItem     │   │   QuoteTerms    │   │ StatusChangeRecord  │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  quantity       │   │  currency       │   │  from → to          │   │
//! │  │  unit_price     │   │  validity_days  │   │  changed_at / by    │   │
//! │  │  discount       │   │  deposit        │   │  comment, metadata  │   │
//! │  │  tax_rate       │   └─────────────────┘   └─────────────────────┘   │
//! │  │  amounts (derived)                                                  │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │   QuoteStatus   │   │    Discount     │   │    QuoteTotals      │   │
//! │  │  DRAFT PENDING  │   │  Percentage(p)  │   │  subtotal, discount │   │
//! │  │  SENT VIEWED    │   │  Absolute(a)    │   │  tax, shipping      │   │
//! │  │  ACCEPTED ...   │   └─────────────────┘   │  total              │   │
//! │  └─────────────────┘                         └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`Quote`](crate::quote::Quote) aggregate lives in its own module.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{ValidationError, ValidationResult};
use crate::money::{Currency, Money, Percentage};
use crate::validation;
use crate::{DEFAULT_VALIDITY_DAYS, SYSTEM_ACTOR_ID};

// =============================================================================
// Quote Status
// =============================================================================

/// Lifecycle status of a quote.
///
/// ```text
///  DRAFT ──► PENDING ──► SENT ◄──► VIEWED
///    │                   │  ▲        │
///    └──────────────────►┘  └resend──┤
///                        │           │
///            ┌───────────┼───────────┤
///            ▼           ▼           ▼
///        ACCEPTED     REJECTED    EXPIRED
///            │
///            ▼
///        CONVERTED
/// ```
///
/// REJECTED, EXPIRED and CONVERTED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    /// Being authored; line items and terms are editable.
    #[default]
    Draft,
    /// Awaiting internal approval; still editable.
    Pending,
    /// Delivered to the customer.
    Sent,
    /// Customer has opened the quote.
    Viewed,
    /// Customer accepted.
    Accepted,
    /// Customer declined.
    Rejected,
    /// Validity window elapsed before a decision.
    Expired,
    /// Turned into an order downstream.
    Converted,
}

impl QuoteStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [QuoteStatus; 8] = [
        QuoteStatus::Draft,
        QuoteStatus::Pending,
        QuoteStatus::Sent,
        QuoteStatus::Viewed,
        QuoteStatus::Accepted,
        QuoteStatus::Rejected,
        QuoteStatus::Expired,
        QuoteStatus::Converted,
    ];

    /// Wire name (`"SENT"`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "DRAFT",
            QuoteStatus::Pending => "PENDING",
            QuoteStatus::Sent => "SENT",
            QuoteStatus::Viewed => "VIEWED",
            QuoteStatus::Accepted => "ACCEPTED",
            QuoteStatus::Rejected => "REJECTED",
            QuoteStatus::Expired => "EXPIRED",
            QuoteStatus::Converted => "CONVERTED",
        }
    }

    /// Human-readable label for badges and emails.
    pub const fn label(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "Draft",
            QuoteStatus::Pending => "Pending Approval",
            QuoteStatus::Sent => "Sent",
            QuoteStatus::Viewed => "Viewed",
            QuoteStatus::Accepted => "Accepted",
            QuoteStatus::Rejected => "Rejected",
            QuoteStatus::Expired => "Expired",
            QuoteStatus::Converted => "Converted",
        }
    }

    /// True for statuses with no outbound transitions.
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            QuoteStatus::Rejected | QuoteStatus::Expired | QuoteStatus::Converted
        )
    }

    /// True while the quote is out with the customer awaiting a decision.
    pub const fn is_outstanding(&self) -> bool {
        matches!(self, QuoteStatus::Sent | QuoteStatus::Viewed)
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        QuoteStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!("unknown quote status '{wanted}'"),
            })
    }
}

// =============================================================================
// Discount
// =============================================================================

/// How a line item is discounted.
///
/// Exactly one representation is authoritative per line. A percentage is
/// resolved against the line subtotal at recompute time; an absolute amount
/// is used as-is and must not exceed the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Discount {
    /// Percent of the line subtotal (5 = 5%).
    Percentage(Percentage),
    /// Fixed amount off the line subtotal.
    Absolute(Money),
}

// =============================================================================
// Line Item
// =============================================================================

/// Derived amounts of a priced line item.
///
/// Invariant: `total == subtotal - discount_amount + tax_amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItemAmounts {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub total: Money,
}

/// One priced entry on a quote.
///
/// ## Stale Derived Amounts
/// ```text
/// LineItem::new(..)            amounts: None   (not yet priced)
///      │
///      ▼
/// pricing::recompute_line_item amounts: Some(..)
///      │
///      ▼
/// set_quantity(5)              amounts: None   (stale, must recompute)
/// ```
///
/// Inputs are private so that every change goes through a setter that
/// discards the derived amounts. Derived amounts are never deserialized:
/// a line item read from the wire is always re-priced before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    id: String,
    description: String,
    quantity: i64,
    unit_price: Money,
    discount: Option<Discount>,
    tax_rate: Percentage,
    #[serde(default, skip_deserializing)]
    amounts: Option<LineItemAmounts>,
}

impl LineItem {
    /// Creates an unpriced line item with a fresh id.
    pub fn new(
        description: impl Into<String>,
        quantity: i64,
        unit_price: Money,
        discount: Option<Discount>,
        tax_rate: Percentage,
    ) -> Self {
        LineItem {
            id: Uuid::new_v4().to_string(),
            description: description.into(),
            quantity,
            unit_price,
            discount,
            tax_rate,
            amounts: None,
        }
    }

    /// Replaces the generated id (for items coming from storage or the UI).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn discount(&self) -> Option<Discount> {
        self.discount
    }

    pub fn tax_rate(&self) -> Percentage {
        self.tax_rate
    }

    /// Derived amounts, or `None` when the item has not been priced since its
    /// last input change.
    pub fn amounts(&self) -> Option<&LineItemAmounts> {
        self.amounts.as_ref()
    }

    /// True when the derived amounts reflect the current inputs.
    pub fn is_priced(&self) -> bool {
        self.amounts.is_some()
    }

    /// Description does not affect pricing, so amounts stay valid.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
        self.amounts = None;
    }

    pub fn set_unit_price(&mut self, unit_price: Money) {
        self.unit_price = unit_price;
        self.amounts = None;
    }

    pub fn set_discount(&mut self, discount: Option<Discount>) {
        self.discount = discount;
        self.amounts = None;
    }

    pub fn set_tax_rate(&mut self, tax_rate: Percentage) {
        self.tax_rate = tax_rate;
        self.amounts = None;
    }

    /// Attaches freshly computed amounts. Only the pricing module calls this.
    pub(crate) fn with_amounts(mut self, amounts: LineItemAmounts) -> Self {
        self.amounts = Some(amounts);
        self
    }

    /// Copy with a fresh id and no derived amounts (for duplication).
    pub(crate) fn duplicate(&self) -> Self {
        LineItem {
            id: Uuid::new_v4().to_string(),
            amounts: None,
            ..self.clone()
        }
    }
}

/// Line item as submitted by the creation / edit wizards.
///
/// Carries the two legacy optional discount fields. Conversion into a
/// [`LineItem`] picks the single authoritative [`Discount`] and rejects
/// payloads that set both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub description: String,
    pub quantity: i64,
    #[ts(type = "string")]
    pub unit_price: Decimal,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub discount_percentage: Option<Decimal>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub discount_amount: Option<Decimal>,
    #[serde(default)]
    #[ts(type = "string")]
    pub tax_rate: Decimal,
}

impl TryFrom<LineItemInput> for LineItem {
    type Error = ValidationError;

    fn try_from(input: LineItemInput) -> ValidationResult<Self> {
        validation::validate_description(&input.description)?;

        let discount = match (input.discount_percentage, input.discount_amount) {
            (Some(_), Some(_)) => return Err(ValidationError::ConflictingDiscount),
            (Some(pct), None) => Some(Discount::Percentage(validation::validate_percentage(
                "discountPercentage",
                pct,
            )?)),
            (None, Some(amount)) => Some(Discount::Absolute(Money::new(amount))),
            (None, None) => None,
        };
        let tax_rate = validation::validate_percentage("taxRate", input.tax_rate)?;

        let item = LineItem::new(
            input.description,
            input.quantity,
            Money::new(input.unit_price),
            discount,
            tax_rate,
        );

        Ok(match input.id {
            Some(id) if !id.trim().is_empty() => item.with_id(id),
            _ => item,
        })
    }
}

// =============================================================================
// Quote Terms & Totals
// =============================================================================

/// Commercial terms attached to a quote.
///
/// Opaque to the pricing engine except `currency`, which selects the display
/// precision, and `validity_days`, which sets the expiry boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTerms {
    #[ts(as = "String")]
    pub currency: Currency,
    pub validity_days: u32,
    pub deposit_required: bool,
    pub deposit_percentage: Option<Percentage>,
}

impl Default for QuoteTerms {
    fn default() -> Self {
        QuoteTerms {
            currency: Currency::usd(),
            validity_days: DEFAULT_VALIDITY_DAYS,
            deposit_required: false,
            deposit_percentage: None,
        }
    }
}

/// Aggregate quote totals.
///
/// Invariant: `total == subtotal - discount_total + tax_total + shipping_total`
/// and every field except `shipping_total` is the sum of the matching
/// per-item amount. Only the pricing module produces values of this type
/// for a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTotals {
    pub subtotal: Money,
    pub discount_total: Money,
    pub tax_total: Money,
    pub shipping_total: Money,
    pub total: Money,
}

// =============================================================================
// Actor & Status Change Record
// =============================================================================

/// Who performed a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Actor {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The scheduler / automation actor (id `"system"`).
    pub fn system() -> Self {
        Actor::system_named("System")
    }

    /// System actor with a custom display name.
    pub fn system_named(name: impl Into<String>) -> Self {
        Actor::new(SYSTEM_ACTOR_ID, name)
    }

    pub fn is_system(&self) -> bool {
        self.id == SYSTEM_ACTOR_ID
    }
}

/// Append-only audit entry for one successful status transition.
///
/// Fields are read-only once the record exists; the only builder,
/// [`StatusChangeRecord::with_metadata`], consumes the record before it is
/// handed to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeRecord {
    id: String,
    from_status: QuoteStatus,
    to_status: QuoteStatus,
    #[ts(as = "String")]
    changed_at: DateTime<Utc>,
    changed_by: String,
    changed_by_name: String,
    comment: Option<String>,
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    metadata: BTreeMap<String, serde_json::Value>,
}

impl StatusChangeRecord {
    pub(crate) fn new(
        from_status: QuoteStatus,
        to_status: QuoteStatus,
        actor: &Actor,
        comment: Option<&str>,
        changed_at: DateTime<Utc>,
    ) -> Self {
        StatusChangeRecord {
            id: Uuid::new_v4().to_string(),
            from_status,
            to_status,
            changed_at,
            changed_by: actor.id.clone(),
            changed_by_name: actor.name.clone(),
            comment: comment
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            metadata: BTreeMap::new(),
        }
    }

    /// Adds a free-form metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn from_status(&self) -> QuoteStatus {
        self.from_status
    }

    pub fn to_status(&self) -> QuoteStatus {
        self.to_status
    }

    pub fn changed_at(&self) -> DateTime<Utc> {
        self.changed_at
    }

    pub fn changed_by(&self) -> &str {
        &self.changed_by
    }

    pub fn changed_by_name(&self) -> &str {
        &self.changed_by_name
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
