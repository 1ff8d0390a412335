//! # Quote Aggregate
//!
//! The quote document: identity, status, line items, terms, derived totals
//! and lifecycle timestamps.
//!
//! ## Who Writes What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Field                    Written only by                              │
//! │  ───────────────────────  ──────────────────────────────────────────   │
//! │  line_items, totals       pricing::reprice_quote (via edit methods)    │
//! │  shipping_total, terms    edit methods (editable statuses only)        │
//! │  status, sent/accepted/   workflow::apply_transition                   │
//! │  rejected/expires_at                                                   │
//! │  updated_at               every mutation                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Edits go through methods that check [`is_editable`] and re-price the
//! whole quote, so aggregate totals can never drift from the line items.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError, ValidationResult};
use crate::money::Money;
use crate::pricing;
use crate::types::{LineItem, QuoteStatus, QuoteTerms, QuoteTotals};
use crate::validation::{validate_customer_id, validate_quote_number, validate_terms};
use crate::workflow::{compute_expiry_state, ensure_editable, is_editable, ExpiryState};
use crate::MAX_LINE_ITEMS;

/// A priced quote document.
///
/// Incoming totals are ignored on deserialize and the quote is re-priced,
/// so a line item that fails pricing rejects the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", try_from = "QuoteRecord")]
pub struct Quote {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-readable number printed on the document.
    pub quote_number: String,

    /// Customer this quote is addressed to.
    pub customer_id: String,

    pub(crate) status: QuoteStatus,

    /// Display order only; pricing does not depend on it.
    pub(crate) line_items: Vec<LineItem>,

    pub(crate) shipping_total: Money,

    pub(crate) terms: QuoteTerms,

    pub(crate) totals: QuoteTotals,

    #[ts(as = "String")]
    pub(crate) created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub(crate) updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub(crate) sent_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub(crate) accepted_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub(crate) rejected_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub(crate) expires_at: Option<DateTime<Utc>>,
}

/// Stored shape of a [`Quote`], without the derived totals.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRecord {
    id: String,
    quote_number: String,
    customer_id: String,
    status: QuoteStatus,
    line_items: Vec<LineItem>,
    shipping_total: Money,
    terms: QuoteTerms,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
    accepted_at: Option<DateTime<Utc>>,
    rejected_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
}

impl TryFrom<QuoteRecord> for Quote {
    type Error = ValidationError;

    fn try_from(record: QuoteRecord) -> ValidationResult<Self> {
        let mut quote = Quote {
            id: record.id,
            quote_number: record.quote_number,
            customer_id: record.customer_id,
            status: record.status,
            line_items: record.line_items,
            shipping_total: record.shipping_total,
            terms: record.terms,
            totals: QuoteTotals::default(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            sent_at: record.sent_at,
            accepted_at: record.accepted_at,
            rejected_at: record.rejected_at,
            expires_at: record.expires_at,
        };
        pricing::reprice_quote(&mut quote)?;
        Ok(quote)
    }
}

impl Quote {
    /// Creates an empty DRAFT quote.
    ///
    /// `expires_at` is provisionally `now + validity_days`; it is re-anchored
    /// on the send date whenever the quote is sent.
    pub fn new(
        quote_number: impl Into<String>,
        customer_id: impl Into<String>,
        terms: QuoteTerms,
        now: DateTime<Utc>,
    ) -> ValidationResult<Self> {
        let quote_number = quote_number.into().trim().to_string();
        validate_quote_number(&quote_number)?;
        validate_terms(&terms)?;

        let customer_id = customer_id.into();
        validate_customer_id(&customer_id)?;

        let expires_at = Some(expiry_from(now, &terms));

        Ok(Quote {
            id: Uuid::new_v4().to_string(),
            quote_number,
            customer_id,
            status: QuoteStatus::Draft,
            line_items: Vec::new(),
            shipping_total: Money::zero(),
            terms,
            totals: QuoteTotals::default(),
            created_at: now,
            updated_at: now,
            sent_at: None,
            accepted_at: None,
            rejected_at: None,
            expires_at,
        })
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn status(&self) -> QuoteStatus {
        self.status
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn line_item(&self, line_item_id: &str) -> Option<&LineItem> {
        self.line_items.iter().find(|item| item.id() == line_item_id)
    }

    pub fn shipping_total(&self) -> Money {
        self.shipping_total
    }

    pub fn terms(&self) -> &QuoteTerms {
        &self.terms
    }

    pub fn totals(&self) -> &QuoteTotals {
        &self.totals
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.sent_at
    }

    pub fn accepted_at(&self) -> Option<DateTime<Utc>> {
        self.accepted_at
    }

    pub fn rejected_at(&self) -> Option<DateTime<Utc>> {
        self.rejected_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// True while line items and terms may change (DRAFT, PENDING).
    pub fn is_editable(&self) -> bool {
        is_editable(self.status)
    }

    /// Expiry state relative to `now`, if the quote has an expiry boundary.
    pub fn expiry_state(&self, now: DateTime<Utc>) -> Option<ExpiryState> {
        self.expires_at
            .map(|expires_at| compute_expiry_state(expires_at, now))
    }

    // -------------------------------------------------------------------------
    // Edits (DRAFT / PENDING only)
    // -------------------------------------------------------------------------

    /// Adds a line item, or replaces the item with the same id.
    ///
    /// ## Errors
    /// - [`CoreError::NotEditable`] outside DRAFT / PENDING
    /// - [`CoreError::Validation`] when the item (or the resulting quote)
    ///   fails pricing validation, or the quote is full
    pub fn upsert_line_item(&mut self, item: LineItem, now: DateTime<Utc>) -> CoreResult<()> {
        ensure_editable(self)?;

        let mut items = self.line_items.clone();
        match items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => *existing = item,
            None => {
                if items.len() >= MAX_LINE_ITEMS {
                    let err = ValidationError::out_of_range("lineItems", 0, MAX_LINE_ITEMS);
                    return Err(err.into());
                }
                items.push(item);
            }
        }

        self.apply_edit(items, self.shipping_total, now)
    }

    /// Removes a line item by id and returns it.
    pub fn remove_line_item(
        &mut self,
        line_item_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<LineItem> {
        ensure_editable(self)?;

        let position = self
            .line_items
            .iter()
            .position(|item| item.id() == line_item_id)
            .ok_or_else(|| CoreError::LineItemNotFound {
                quote_id: self.id.clone(),
                line_item_id: line_item_id.to_string(),
            })?;

        let mut items = self.line_items.clone();
        let removed = items.remove(position);
        self.apply_edit(items, self.shipping_total, now)?;
        Ok(removed)
    }

    /// Sets the flat shipping amount.
    pub fn set_shipping_total(
        &mut self,
        shipping_total: Money,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        ensure_editable(self)?;
        self.apply_edit(self.line_items.clone(), shipping_total, now)
    }

    /// Replaces the commercial terms. The provisional expiry moves with the
    /// new validity period.
    pub fn update_terms(&mut self, terms: QuoteTerms, now: DateTime<Utc>) -> CoreResult<()> {
        ensure_editable(self)?;
        validate_terms(&terms)?;

        self.expires_at = Some(expiry_from(self.created_at, &terms));
        self.terms = terms;
        self.updated_at = now;
        Ok(())
    }

    /// Re-prices items and totals without any other change.
    pub fn reprice(&mut self) -> ValidationResult<()> {
        pricing::reprice_quote(self)
    }

    /// Copies customer, terms, shipping and items (with fresh ids) into a new
    /// DRAFT quote. This is the only way forward from a terminal quote.
    pub fn duplicate(
        &self,
        quote_number: impl Into<String>,
        now: DateTime<Utc>,
    ) -> ValidationResult<Quote> {
        let mut copy = Quote::new(quote_number, self.customer_id.clone(), self.terms.clone(), now)?;
        copy.line_items = self.line_items.iter().map(LineItem::duplicate).collect();
        copy.shipping_total = self.shipping_total;
        pricing::reprice_quote(&mut copy)?;
        Ok(copy)
    }

    // -------------------------------------------------------------------------
    // Internal
    // -------------------------------------------------------------------------

    /// Prices a candidate item list first; commits only on success.
    fn apply_edit(
        &mut self,
        items: Vec<LineItem>,
        shipping_total: Money,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let mut candidate = self.clone();
        candidate.line_items = items;
        candidate.shipping_total = shipping_total;
        pricing::reprice_quote(&mut candidate)?;
        candidate.updated_at = now;

        *self = candidate;
        Ok(())
    }

    pub(crate) fn replace_pricing(&mut self, line_items: Vec<LineItem>, totals: QuoteTotals) {
        self.line_items = line_items;
        self.totals = totals;
    }
}

/// Expiry boundary `validity_days` after `anchor`.
pub(crate) fn expiry_from(anchor: DateTime<Utc>, terms: &QuoteTerms) -> DateTime<Utc> {
    anchor + Duration::days(i64::from(terms.validity_days))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Percentage;
    use crate::types::{Actor, Discount};
    use crate::workflow::apply_transition;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn item(qty: i64, price: rust_decimal::Decimal) -> LineItem {
        LineItem::new(
            "Seat licence",
            qty,
            Money::new(price),
            Percentage::new(dec!(5)).map(Discount::Percentage),
            Percentage::new(dec!(8.5)).unwrap(),
        )
    }

    fn draft() -> Quote {
        Quote::new("Q-000001", "cust-1", QuoteTerms::default(), now()).unwrap()
    }

    #[test]
    fn test_new_quote_is_empty_draft() {
        let quote = draft();
        assert_eq!(quote.status(), QuoteStatus::Draft);
        assert!(quote.line_items().is_empty());
        assert_eq!(*quote.totals(), QuoteTotals::default());
        assert_eq!(quote.expires_at(), Some(now() + Duration::days(30)));
    }

    #[test]
    fn test_new_quote_validates_inputs() {
        assert!(Quote::new("", "cust-1", QuoteTerms::default(), now()).is_err());
        assert!(Quote::new("Q-1", " ", QuoteTerms::default(), now()).is_err());

        let terms = QuoteTerms {
            validity_days: 0,
            ..QuoteTerms::default()
        };
        assert!(Quote::new("Q-1", "cust-1", terms, now()).is_err());
    }

    #[test]
    fn test_upsert_reprices_totals() {
        let mut quote = draft();
        let later = now() + Duration::minutes(5);

        quote.upsert_line_item(item(2, dec!(5000)), later).unwrap();
        assert_eq!(quote.totals().total.amount(), dec!(10307.5));
        assert_eq!(quote.updated_at(), later);
        assert!(quote.line_items()[0].is_priced());

        let mut changed = quote.line_items()[0].clone();
        changed.set_quantity(1);
        quote.upsert_line_item(changed, later).unwrap();
        assert_eq!(quote.line_items().len(), 1);
        assert_eq!(quote.totals().subtotal.amount(), dec!(5000));
    }

    #[test]
    fn test_failed_edit_leaves_quote_untouched() {
        let mut quote = draft();
        quote.upsert_line_item(item(2, dec!(5000)), now()).unwrap();
        let before = quote.clone();

        let err = quote
            .upsert_line_item(item(-3, dec!(10)), now() + Duration::hours(1))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(quote, before);
    }

    #[test]
    fn test_remove_line_item() {
        let mut quote = draft();
        let first = item(2, dec!(5000));
        let first_id = first.id().to_string();
        quote.upsert_line_item(first, now()).unwrap();
        quote.upsert_line_item(item(1, dec!(100)), now()).unwrap();

        let removed = quote.remove_line_item(&first_id, now()).unwrap();
        assert_eq!(removed.id(), first_id);
        assert_eq!(quote.line_items().len(), 1);
        assert_eq!(quote.totals().subtotal.amount(), dec!(100));

        assert!(matches!(
            quote.remove_line_item("missing", now()),
            Err(CoreError::LineItemNotFound { .. })
        ));
    }

    #[test]
    fn test_shipping_total() {
        let mut quote = draft();
        quote.upsert_line_item(item(2, dec!(5000)), now()).unwrap();
        quote.set_shipping_total(Money::new(dec!(42.5)), now()).unwrap();
        assert_eq!(quote.totals().total.amount(), dec!(10350));

        assert!(quote
            .set_shipping_total(Money::new(dec!(-1)), now())
            .is_err());
        assert_eq!(quote.shipping_total().amount(), dec!(42.5));
    }

    #[test]
    fn test_edits_rejected_once_sent() {
        let mut quote = draft();
        quote.upsert_line_item(item(1, dec!(10)), now()).unwrap();
        let (mut sent, _) =
            apply_transition(&quote, QuoteStatus::Sent, &Actor::new("u-1", "Ada"), None, now())
                .unwrap();

        let err = sent.upsert_line_item(item(1, dec!(10)), now()).unwrap_err();
        assert_eq!(
            err,
            CoreError::NotEditable {
                quote_id: sent.id.clone(),
                status: QuoteStatus::Sent,
            }
        );
        assert!(sent
            .update_terms(QuoteTerms::default(), now())
            .is_err());
    }

    #[test]
    fn test_update_terms_moves_provisional_expiry() {
        let mut quote = draft();
        let terms = QuoteTerms {
            validity_days: 7,
            ..QuoteTerms::default()
        };
        quote.update_terms(terms, now()).unwrap();
        assert_eq!(quote.expires_at(), Some(now() + Duration::days(7)));
    }

    #[test]
    fn test_duplicate_copies_into_fresh_draft() {
        let mut quote = draft();
        quote.upsert_line_item(item(2, dec!(5000)), now()).unwrap();
        quote.set_shipping_total(Money::new(dec!(10)), now()).unwrap();

        let later = now() + Duration::days(60);
        let copy = quote.duplicate("Q-000002", later).unwrap();

        assert_ne!(copy.id, quote.id);
        assert_eq!(copy.quote_number, "Q-000002");
        assert_eq!(copy.status(), QuoteStatus::Draft);
        assert_eq!(copy.created_at(), later);
        assert_eq!(copy.totals(), quote.totals());
        assert_ne!(copy.line_items()[0].id(), quote.line_items()[0].id());
    }

    #[test]
    fn test_deserialized_quote_is_priced() {
        let mut quote = draft();
        quote.upsert_line_item(item(2, dec!(5000)), now()).unwrap();

        let json = serde_json::to_string(&quote).unwrap();
        let back: Quote = serde_json::from_str(&json).unwrap();
        assert!(back.line_items()[0].is_priced());
        assert_eq!(back, quote);
    }

    #[test]
    fn test_deserialized_totals_are_recomputed() {
        let mut quote = draft();
        quote.upsert_line_item(item(2, dec!(5000)), now()).unwrap();

        let mut json = serde_json::to_value(&quote).unwrap();
        json["totals"]["total"] = serde_json::json!("1");
        json["totals"]["subtotal"] = serde_json::json!("1");

        let back: Quote = serde_json::from_value(json).unwrap();
        assert_eq!(back.totals().total.amount(), dec!(10307.5));
        assert_eq!(back.totals(), quote.totals());
    }

    #[test]
    fn test_deserialize_rejects_unpriceable_items() {
        let mut quote = draft();
        quote.upsert_line_item(item(2, dec!(5000)), now()).unwrap();

        let mut json = serde_json::to_value(&quote).unwrap();
        json["lineItems"][0]["quantity"] = serde_json::json!(-1);

        assert!(serde_json::from_value::<Quote>(json).is_err());
    }
}
