//! # Pricing Calculator
//!
//! Derives line item amounts and quote totals from their inputs. This is the
//! single source of truth for quote arithmetic: the creation wizard, edit
//! wizard, detail view and email templating all call these functions.
//!
//! ## Line Item Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal        = quantity × unit_price                               │
//! │  discount_amount = subtotal × pct / 100      (Discount::Percentage)    │
//! │                  = amount                    (Discount::Absolute)      │
//! │  tax_amount      = (subtotal − discount_amount) × tax_rate / 100       │
//! │  total           = subtotal − discount_amount + tax_amount             │
//! │                                                                         │
//! │  2 × 5000, 5% off, 8.5% tax                                            │
//! │    subtotal 10000 → discount 500 → tax 807.5 → total 10307.5           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No intermediate value is rounded. Rounding to the currency's minor unit
//! happens only at presentation time ([`Money::format`]).

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::quote::Quote;
use crate::types::{Discount, LineItem, LineItemAmounts, QuoteTotals};
use crate::validation::{validate_amount, validate_quantity};

// =============================================================================
// Line Items
// =============================================================================

/// Recomputes a line item's derived amounts from its inputs.
///
/// Pure and idempotent: the result depends only on quantity, unit price,
/// discount and tax rate, so recomputing an already-priced item yields an
/// identical item.
///
/// ## Errors
/// - negative quantity or unit price → [`ValidationError::MustBeNonNegative`]
/// - negative absolute discount → [`ValidationError::MustBeNonNegative`]
/// - absolute discount above the subtotal → [`ValidationError::DiscountExceedsSubtotal`]
///
/// Percentages are range-checked when a [`Percentage`](crate::money::Percentage)
/// is built, so an out-of-range tax or discount rate cannot reach this point.
///
/// ## Example
/// ```rust
/// use quotedesk_core::money::{Money, Percentage};
/// use quotedesk_core::pricing::recompute_line_item;
/// use quotedesk_core::types::{Discount, LineItem};
/// use rust_decimal::Decimal;
///
/// let item = LineItem::new(
///     "Implementation",
///     2,
///     Money::new(Decimal::new(5000, 0)),
///     Percentage::new(Decimal::new(5, 0)).map(Discount::Percentage),
///     Percentage::new(Decimal::new(85, 1)).unwrap(),
/// );
///
/// let priced = recompute_line_item(&item).unwrap();
/// let amounts = priced.amounts().unwrap();
/// assert_eq!(amounts.total.amount(), Decimal::new(103075, 1)); // 10307.5
/// ```
pub fn recompute_line_item(item: &LineItem) -> ValidationResult<LineItem> {
    validate_quantity(item.quantity())?;
    validate_amount("unitPrice", item.unit_price())?;

    let subtotal = item.unit_price().multiply_quantity(item.quantity());

    let discount_amount = match item.discount() {
        None => Money::zero(),
        Some(Discount::Percentage(pct)) => pct.of(subtotal),
        Some(Discount::Absolute(amount)) => {
            validate_amount("discountAmount", amount)?;
            if amount > subtotal {
                return Err(ValidationError::DiscountExceedsSubtotal {
                    discount: amount,
                    subtotal,
                });
            }
            amount
        }
    };

    let tax_amount = item.tax_rate().of(subtotal - discount_amount);
    let total = subtotal - discount_amount + tax_amount;

    Ok(item.clone().with_amounts(LineItemAmounts {
        subtotal,
        discount_amount,
        tax_amount,
        total,
    }))
}

/// Recomputes every item, failing on the first invalid one.
pub fn recompute_line_items(items: &[LineItem]) -> ValidationResult<Vec<LineItem>> {
    items.iter().map(recompute_line_item).collect()
}

// =============================================================================
// Quote Totals
// =============================================================================

/// Computes aggregate totals for a list of line items plus flat shipping.
///
/// Each item is recomputed first, so stale derived amounts never leak into
/// the totals. Summation is commutative: item order does not matter. An empty
/// list yields all-zero totals (plus shipping).
///
/// ## Example
/// ```rust
/// use quotedesk_core::money::Money;
/// use quotedesk_core::pricing::recompute_quote_totals;
///
/// let totals = recompute_quote_totals(&[], Money::zero()).unwrap();
/// assert!(totals.total.is_zero());
/// ```
pub fn recompute_quote_totals(
    items: &[LineItem],
    shipping_total: Money,
) -> ValidationResult<QuoteTotals> {
    let priced = recompute_line_items(items)?;
    totals_for_priced(&priced, shipping_total)
}

/// Sums already-recomputed items. Callers must pass the output of
/// [`recompute_line_items`].
fn totals_for_priced(priced: &[LineItem], shipping_total: Money) -> ValidationResult<QuoteTotals> {
    validate_amount("shippingTotal", shipping_total)?;

    let amounts: Vec<LineItemAmounts> = priced
        .iter()
        .filter_map(|item| item.amounts().copied())
        .collect();

    let subtotal: Money = amounts.iter().map(|a| a.subtotal).sum();
    let discount_total: Money = amounts.iter().map(|a| a.discount_amount).sum();
    let tax_total: Money = amounts.iter().map(|a| a.tax_amount).sum();

    Ok(QuoteTotals {
        subtotal,
        discount_total,
        tax_total,
        shipping_total,
        total: subtotal - discount_total + tax_total + shipping_total,
    })
}

/// Re-prices a quote in place: every line item and the aggregate totals.
///
/// All-or-nothing: on error the quote is left untouched.
pub fn reprice_quote(quote: &mut Quote) -> ValidationResult<()> {
    let priced = recompute_line_items(quote.line_items())?;
    let totals = totals_for_priced(&priced, quote.shipping_total())?;
    quote.replace_pricing(priced, totals);
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Percentage;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn pct(value: Decimal) -> Percentage {
        Percentage::new(value).unwrap()
    }

    fn reference_item() -> LineItem {
        LineItem::new(
            "Implementation services",
            2,
            Money::new(dec!(5000)),
            Some(Discount::Percentage(pct(dec!(5)))),
            pct(dec!(8.5)),
        )
    }

    #[test]
    fn test_reference_line_item() {
        let priced = recompute_line_item(&reference_item()).unwrap();
        let amounts = priced.amounts().unwrap();

        assert_eq!(amounts.subtotal.amount(), dec!(10000));
        assert_eq!(amounts.discount_amount.amount(), dec!(500));
        assert_eq!(amounts.tax_amount.amount(), dec!(807.5));
        assert_eq!(amounts.total.amount(), dec!(10307.5));
    }

    #[test]
    fn test_absolute_discount_used_as_is() {
        let item = LineItem::new(
            "Hardware",
            3,
            Money::new(dec!(19.99)),
            Some(Discount::Absolute(Money::new(dec!(9.97)))),
            pct(dec!(10)),
        );
        let amounts = *recompute_line_item(&item).unwrap().amounts().unwrap();

        assert_eq!(amounts.subtotal.amount(), dec!(59.97));
        assert_eq!(amounts.discount_amount.amount(), dec!(9.97));
        assert_eq!(amounts.tax_amount.amount(), dec!(5));
        assert_eq!(amounts.total.amount(), dec!(55));
    }

    #[test]
    fn test_absolute_discount_equal_to_subtotal_is_allowed() {
        let item = LineItem::new(
            "Free pilot",
            1,
            Money::new(dec!(250)),
            Some(Discount::Absolute(Money::new(dec!(250)))),
            pct(dec!(20)),
        );
        let amounts = *recompute_line_item(&item).unwrap().amounts().unwrap();
        assert!(amounts.total.is_zero());
    }

    #[test]
    fn test_no_intermediate_rounding() {
        // 1 × 0.10 at 7.25% tax = 0.00725, kept exact
        let item = LineItem::new("Sticker", 1, Money::new(dec!(0.10)), None, pct(dec!(7.25)));
        let amounts = *recompute_line_item(&item).unwrap().amounts().unwrap();
        assert_eq!(amounts.tax_amount.amount(), dec!(0.00725));
    }

    #[test]
    fn test_rejects_negative_quantity() {
        let mut item = reference_item();
        item.set_quantity(-1);
        assert_eq!(
            recompute_line_item(&item),
            Err(ValidationError::negative("quantity"))
        );
    }

    #[test]
    fn test_rejects_negative_unit_price() {
        let mut item = reference_item();
        item.set_unit_price(Money::new(dec!(-1)));
        assert_eq!(
            recompute_line_item(&item),
            Err(ValidationError::negative("unitPrice"))
        );
    }

    #[test]
    fn test_rejects_discount_above_subtotal() {
        let mut item = reference_item();
        item.set_discount(Some(Discount::Absolute(Money::new(dec!(10000.01)))));
        assert_eq!(
            recompute_line_item(&item),
            Err(ValidationError::DiscountExceedsSubtotal {
                discount: Money::new(dec!(10000.01)),
                subtotal: Money::new(dec!(10000)),
            })
        );
    }

    #[test]
    fn test_rejects_negative_absolute_discount() {
        let mut item = reference_item();
        item.set_discount(Some(Discount::Absolute(Money::new(dec!(-5)))));
        assert_eq!(
            recompute_line_item(&item),
            Err(ValidationError::negative("discountAmount"))
        );
    }

    #[test]
    fn test_empty_quote_totals_are_zero() {
        let totals = recompute_quote_totals(&[], Money::zero()).unwrap();
        assert_eq!(totals, QuoteTotals::default());
    }

    #[test]
    fn test_two_reference_items_sum() {
        let a = recompute_line_item(&reference_item()).unwrap();
        let b = recompute_line_item(&reference_item()).unwrap();
        let totals = recompute_quote_totals(&[a.clone(), b.clone()], Money::zero()).unwrap();

        let expected = a.amounts().unwrap().total + b.amounts().unwrap().total;
        assert_eq!(totals.total, expected);
        assert_eq!(totals.total.amount(), dec!(20615));
        assert_eq!(totals.subtotal.amount(), dec!(20000));
        assert_eq!(totals.discount_total.amount(), dec!(1000));
        assert_eq!(totals.tax_total.amount(), dec!(1615));
    }

    #[test]
    fn test_shipping_added_to_total_only() {
        let totals = recompute_quote_totals(&[reference_item()], Money::new(dec!(49.5))).unwrap();
        assert_eq!(totals.subtotal.amount(), dec!(10000));
        assert_eq!(totals.shipping_total.amount(), dec!(49.5));
        assert_eq!(totals.total.amount(), dec!(10357));
    }

    #[test]
    fn test_negative_shipping_rejected() {
        assert_eq!(
            recompute_quote_totals(&[], Money::new(dec!(-1))),
            Err(ValidationError::negative("shippingTotal"))
        );
    }

    #[test]
    fn test_stale_items_are_recomputed() {
        let mut stale = recompute_line_item(&reference_item()).unwrap();
        stale.set_quantity(1);
        assert!(!stale.is_priced());

        let totals = recompute_quote_totals(&[stale], Money::zero()).unwrap();
        assert_eq!(totals.subtotal.amount(), dec!(5000));
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    fn money_strategy() -> impl Strategy<Value = Money> {
        (0i64..10_000_000, 0u32..=4)
            .prop_map(|(units, scale)| Money::new(Decimal::new(units, scale)))
    }

    fn percentage_strategy() -> impl Strategy<Value = Percentage> {
        (0i64..=10_000).prop_map(|bps| pct(Decimal::new(bps, 2)))
    }

    /// Discount kind to draw; an absolute amount is a share of the subtotal.
    #[derive(Debug, Clone)]
    enum DiscountPick {
        None,
        Percentage(Percentage),
        AbsoluteShare(Percentage),
    }

    fn discount_strategy() -> impl Strategy<Value = DiscountPick> {
        prop_oneof![
            Just(DiscountPick::None),
            percentage_strategy().prop_map(DiscountPick::Percentage),
            percentage_strategy().prop_map(DiscountPick::AbsoluteShare),
        ]
    }

    fn line_item_strategy() -> impl Strategy<Value = LineItem> {
        (
            0i64..10_000,
            money_strategy(),
            discount_strategy(),
            percentage_strategy(),
        )
            .prop_map(|(qty, price, pick, tax)| {
                let discount = match pick {
                    DiscountPick::None => None,
                    DiscountPick::Percentage(rate) => Some(Discount::Percentage(rate)),
                    DiscountPick::AbsoluteShare(share) => {
                        Some(Discount::Absolute(share.of(price.multiply_quantity(qty))))
                    }
                };
                LineItem::new("item", qty, price, discount, tax)
            })
    }

    proptest! {
        #[test]
        fn prop_recompute_is_idempotent(item in line_item_strategy()) {
            let once = recompute_line_item(&item).unwrap();
            let twice = recompute_line_item(&once).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_line_total_identity(item in line_item_strategy()) {
            let priced = recompute_line_item(&item).unwrap();
            let a = priced.amounts().unwrap();
            prop_assert_eq!(a.total, a.subtotal - a.discount_amount + a.tax_amount);
        }

        #[test]
        fn prop_quote_totals_are_sums(
            items in prop::collection::vec(line_item_strategy(), 0..12),
            shipping in money_strategy(),
        ) {
            let totals = recompute_quote_totals(&items, shipping).unwrap();
            let priced = recompute_line_items(&items).unwrap();

            let subtotal: Money = priced.iter().map(|i| i.amounts().unwrap().subtotal).sum();
            let discount: Money = priced.iter().map(|i| i.amounts().unwrap().discount_amount).sum();
            let tax: Money = priced.iter().map(|i| i.amounts().unwrap().tax_amount).sum();

            prop_assert_eq!(totals.subtotal, subtotal);
            prop_assert_eq!(totals.discount_total, discount);
            prop_assert_eq!(totals.tax_total, tax);
            prop_assert_eq!(
                totals.total,
                totals.subtotal - totals.discount_total + totals.tax_total + totals.shipping_total
            );
        }

        #[test]
        fn prop_totals_ignore_item_order(
            items in prop::collection::vec(line_item_strategy(), 0..12),
        ) {
            let forward = recompute_quote_totals(&items, Money::zero()).unwrap();
            let mut reversed = items.clone();
            reversed.reverse();
            let backward = recompute_quote_totals(&reversed, Money::zero()).unwrap();
            prop_assert_eq!(forward, backward);
        }
    }
}
