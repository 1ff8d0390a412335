//! # Email Template Data
//!
//! Flattens a quote into plain strings for the email templating layer.
//! Amounts are rounded to the currency's minor units here, and only here.
//!
//! ```text
//! Quote ──clone──► reprice_quote ──► Money::format(currency) ──► QuoteEmailContext
//! ```
//!
//! Building a context never changes status; the templating layer does not
//! drive the workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationResult;
use crate::money::Money;
use crate::pricing;
use crate::quote::Quote;
use crate::types::Discount;

/// Date format used for validity dates in emails.
const EMAIL_DATE_FORMAT: &str = "%Y-%m-%d";

/// One rendered line of the quote table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EmailLineRow {
    pub description: String,
    pub quantity: i64,
    pub unit_price: String,
    /// `"5%"`, a formatted amount, or empty when undiscounted.
    pub discount: String,
    pub tax_rate: String,
    pub total: String,
}

/// Template variables for a quote email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QuoteEmailContext {
    pub quote_number: String,
    pub customer_id: String,
    pub status: String,
    pub status_label: String,
    pub currency: String,
    pub lines: Vec<EmailLineRow>,
    pub subtotal: String,
    pub discount_total: String,
    pub tax_total: String,
    pub shipping_total: String,
    pub total: String,
    pub deposit_due: Option<String>,
    pub valid_until: Option<String>,
    pub days_remaining: Option<i64>,
    pub is_expired: bool,
}

impl QuoteEmailContext {
    /// Builds the context from a freshly re-priced copy of `quote`.
    pub fn build(quote: &Quote, now: DateTime<Utc>) -> ValidationResult<Self> {
        let mut priced = quote.clone();
        pricing::reprice_quote(&mut priced)?;

        let currency = priced.terms().currency.clone();
        let totals = *priced.totals();
        let fmt = |money: Money| money.format(&currency);

        let lines = priced
            .line_items()
            .iter()
            .map(|item| EmailLineRow {
                description: item.description().to_string(),
                quantity: item.quantity(),
                unit_price: fmt(item.unit_price()),
                discount: match item.discount() {
                    None => String::new(),
                    Some(Discount::Percentage(pct)) => pct.to_string(),
                    Some(Discount::Absolute(amount)) => fmt(amount),
                },
                tax_rate: item.tax_rate().to_string(),
                total: item
                    .amounts()
                    .map(|a| fmt(a.total))
                    .unwrap_or_default(),
            })
            .collect();

        let terms = priced.terms();
        let deposit_due = match (terms.deposit_required, terms.deposit_percentage) {
            (true, Some(pct)) => Some(fmt(pct.of(totals.total))),
            _ => None,
        };

        let expiry = priced.expiry_state(now);

        Ok(QuoteEmailContext {
            quote_number: priced.quote_number.clone(),
            customer_id: priced.customer_id.clone(),
            status: priced.status().as_str().to_string(),
            status_label: priced.status().label().to_string(),
            currency: currency.code().to_string(),
            lines,
            subtotal: fmt(totals.subtotal),
            discount_total: fmt(totals.discount_total),
            tax_total: fmt(totals.tax_total),
            shipping_total: fmt(totals.shipping_total),
            total: fmt(totals.total),
            deposit_due,
            valid_until: priced
                .expires_at()
                .map(|at| at.format(EMAIL_DATE_FORMAT).to_string()),
            days_remaining: expiry.map(|state| state.days_remaining),
            is_expired: expiry.is_some_and(|state| state.is_expired),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Currency, Percentage};
    use crate::types::{Actor, LineItem, QuoteStatus, QuoteTerms};
    use crate::workflow::apply_transition;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn reference_quote(terms: QuoteTerms) -> Quote {
        let mut quote = Quote::new("Q-000042", "acme", terms, now()).unwrap();
        quote
            .upsert_line_item(
                LineItem::new(
                    "Implementation services",
                    2,
                    Money::new(dec!(5000)),
                    Percentage::new(dec!(5)).map(Discount::Percentage),
                    Percentage::new(dec!(8.5)).unwrap(),
                ),
                now(),
            )
            .unwrap();
        quote
    }

    #[test]
    fn test_reference_quote_context() {
        let ctx = QuoteEmailContext::build(&reference_quote(QuoteTerms::default()), now()).unwrap();

        assert_eq!(ctx.quote_number, "Q-000042");
        assert_eq!(ctx.status, "DRAFT");
        assert_eq!(ctx.status_label, "Draft");
        assert_eq!(ctx.currency, "USD");
        assert_eq!(ctx.subtotal, "$10000.00");
        assert_eq!(ctx.discount_total, "$500.00");
        assert_eq!(ctx.tax_total, "$807.50");
        assert_eq!(ctx.total, "$10307.50");
        assert_eq!(ctx.deposit_due, None);
        assert_eq!(ctx.valid_until.as_deref(), Some("2024-05-31"));
        assert_eq!(ctx.days_remaining, Some(30));
        assert!(!ctx.is_expired);

        let row = &ctx.lines[0];
        assert_eq!(row.discount, "5%");
        assert_eq!(row.tax_rate, "8.5%");
        assert_eq!(row.unit_price, "$5000.00");
        assert_eq!(row.total, "$10307.50");
    }

    #[test]
    fn test_zero_decimal_currency_and_deposit() {
        let terms = QuoteTerms {
            currency: Currency::new("JPY").unwrap(),
            deposit_required: true,
            deposit_percentage: Percentage::new(dec!(30)),
            ..QuoteTerms::default()
        };
        let ctx = QuoteEmailContext::build(&reference_quote(terms), now()).unwrap();

        assert_eq!(ctx.tax_total, "¥808");
        assert_eq!(ctx.total, "¥10308");
        // 30% of 10307.5 = 3092.25
        assert_eq!(ctx.deposit_due.as_deref(), Some("¥3092"));
    }

    #[test]
    fn test_context_reflects_expiry_after_send() {
        let quote = reference_quote(QuoteTerms::default());
        let (sent, _) = apply_transition(
            &quote,
            QuoteStatus::Sent,
            &Actor::new("u-1", "Ada"),
            None,
            now(),
        )
        .unwrap();

        let ctx = QuoteEmailContext::build(&sent, now() + Duration::days(31)).unwrap();
        assert_eq!(ctx.status_label, "Sent");
        assert!(ctx.is_expired);
        assert_eq!(ctx.days_remaining, Some(-1));
    }
}
