//! # Money Module
//!
//! Provides the `Money`, `Percentage` and `Currency` types used by the
//! pricing engine.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  THE EARLY ROUNDING PROBLEM                                             │
//! │    Rounding every line's tax to cents, then summing 200 lines,          │
//! │    drifts away from the tax on the summed amounts.                      │
//! │                                                                         │
//! │  OUR SOLUTION: Exact base-10 decimals, rounded ONLY for display         │
//! │    2 × 5000 × 8.5% = 807.5 exactly, stored as 807.5                     │
//! │    Money::format(USD) → "$807.50" when rendered                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use quotedesk_core::money::{Currency, Money};
//! use rust_decimal::Decimal;
//!
//! let price = Money::new(Decimal::new(1099, 2)); // 10.99
//! let line = price.multiply_quantity(3);         // 32.97
//!
//! let usd = Currency::usd();
//! assert_eq!(line.format(&usd), "$32.97");
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{ValidationError, ValidationResult};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the quote's currency, held as an exact decimal.
///
/// ## Design Decisions
/// - **Decimal (signed)**: negative values are representable so validation
///   can reject them with a precise message instead of failing to parse
/// - **No currency inside**: a quote has exactly one currency (in its terms),
///   so every amount on it shares that currency
/// - **No implicit rounding**: arithmetic is exact; only [`Money::round_to`]
///   and [`Money::format`] round, and only for presentation
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  LineItem.unit_price × quantity ──► subtotal ──► discount ──► tax       │
/// │                                                              │          │
/// │                                                              ▼          │
/// │  Σ line totals + Quote.shipping_total ──────────────► QuoteTotals.total │
/// │                                                              │          │
/// │                                                              ▼          │
/// │                          QuoteEmailContext ("$10307.50" via format)     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Creates a Money value from a decimal amount in major units.
    ///
    /// ## Example
    /// ```rust
    /// use quotedesk_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let price = Money::new(Decimal::new(5000, 0));
    /// assert_eq!(price.amount(), Decimal::new(5000, 0));
    /// ```
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Returns the exact decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use quotedesk_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let unit_price = Money::new(Decimal::new(299, 2)); // 2.99
    /// let line = unit_price.multiply_quantity(3);
    /// assert_eq!(line.amount(), Decimal::new(897, 2)); // 8.97
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * Decimal::from(qty))
    }

    /// Rounds to the currency's minor-unit precision (half away from zero).
    ///
    /// Presentation only: the pricing engine never calls this.
    ///
    /// ## Example
    /// ```rust
    /// use quotedesk_core::money::{Currency, Money};
    /// use rust_decimal::Decimal;
    ///
    /// let tax = Money::new(Decimal::new(80755, 2)); // 807.55
    /// let jpy = Currency::new("JPY").unwrap();
    /// assert_eq!(tax.round_to(&jpy).amount(), Decimal::new(808, 0));
    /// ```
    pub fn round_to(&self, currency: &Currency) -> Money {
        let strategy = RoundingStrategy::MidpointAwayFromZero;
        Money(self.0.round_dp_with_strategy(currency.minor_units(), strategy))
    }

    /// Formats the amount for display in the given currency.
    ///
    /// ## Format
    /// - Known symbols: `$10307.50`, `€12.00`, `¥808`
    /// - Other codes: `CHF 12.00`
    /// - Negative: `-$5.50`
    pub fn format(&self, currency: &Currency) -> String {
        let mut rounded = self.round_to(currency).0;
        rounded.rescale(currency.minor_units());

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let digits = rounded.abs().to_string();

        match currency.symbol() {
            Some(symbol) => format!("{sign}{symbol}{digits}"),
            None => format!("{sign}{} {digits}", currency.code()),
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Exact amount with trailing zeros stripped (`807.5`, `10000`).
///
/// ## Note
/// For debugging and error messages. Use [`Money::format`] for documents.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a decimal factor (rates, fractions).
impl Mul<Decimal> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Decimal) -> Self {
        Money(self.0 * factor)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Percentage
// =============================================================================

/// A percentage in the closed range `[0, 100]`.
///
/// Used for tax rates, discount percentages and deposit percentages. The
/// range is checked on construction and on deserialization, so a value of
/// this type is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(try_from = "Decimal", into = "Decimal")]
#[ts(export)]
pub struct Percentage(#[ts(type = "string")] Decimal);

impl Percentage {
    /// Creates a percentage, or `None` when outside `[0, 100]`.
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            None
        } else {
            Some(Percentage(value))
        }
    }

    /// Zero percent.
    #[inline]
    pub const fn zero() -> Self {
        Percentage(Decimal::ZERO)
    }

    /// Returns the percentage value (8.5 for 8.5%).
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Returns the exact share of `amount` this percentage represents.
    ///
    /// ## Example
    /// ```rust
    /// use quotedesk_core::money::{Money, Percentage};
    /// use rust_decimal::Decimal;
    ///
    /// let tax_rate = Percentage::new(Decimal::new(85, 1)).unwrap(); // 8.5%
    /// let tax = tax_rate.of(Money::new(Decimal::new(9500, 0)));
    /// assert_eq!(tax.amount(), Decimal::new(8075, 1)); // 807.5
    /// ```
    pub fn of(&self, amount: Money) -> Money {
        amount * (self.0 / Decimal::ONE_HUNDRED)
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Percentage::zero()
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Percentage::new(value).ok_or_else(|| ValidationError::out_of_range("percentage", 0, 100))
    }
}

impl From<Percentage> for Decimal {
    fn from(pct: Percentage) -> Self {
        pct.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

// =============================================================================
// Currency
// =============================================================================

/// ISO 4217 codes whose minor unit is zero (no decimal places).
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "ISK", "JPY", "KMF", "KRW", "PYG", "RWF", "UGX", "VND", "VUV",
    "XAF", "XOF", "XPF",
];

/// A quote's currency: ISO 4217 code plus the precision used for display.
///
/// Serialized as the bare code (`"USD"`); fields holding a currency are
/// exported to TypeScript as `string`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency {
    code: String,
    minor_units: u32,
}

impl Currency {
    /// Parses a three-letter currency code (case-insensitive).
    ///
    /// ## Example
    /// ```rust
    /// use quotedesk_core::money::Currency;
    ///
    /// assert_eq!(Currency::new("usd").unwrap().minor_units(), 2);
    /// assert_eq!(Currency::new("JPY").unwrap().minor_units(), 0);
    /// assert!(Currency::new("DOLLARS").is_err());
    /// ```
    pub fn new(code: &str) -> ValidationResult<Self> {
        let code = code.trim().to_ascii_uppercase();

        if code.is_empty() {
            return Err(ValidationError::Required {
                field: "currency".to_string(),
            });
        }

        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidFormat {
                field: "currency".to_string(),
                reason: "must be a three-letter ISO 4217 code".to_string(),
            });
        }

        let minor_units = if ZERO_DECIMAL_CURRENCIES.contains(&code.as_str()) {
            0
        } else {
            2
        };

        Ok(Currency { code, minor_units })
    }

    /// US dollars.
    pub fn usd() -> Self {
        Currency {
            code: "USD".to_string(),
            minor_units: 2,
        }
    }

    /// Returns the upper-case ISO code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Number of decimal places shown for this currency.
    pub const fn minor_units(&self) -> u32 {
        self.minor_units
    }

    fn symbol(&self) -> Option<&'static str> {
        match self.code.as_str() {
            "USD" => Some("$"),
            "EUR" => Some("€"),
            "GBP" => Some("£"),
            "JPY" => Some("¥"),
            "INR" => Some("₹"),
            _ => None,
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::usd()
    }
}

impl TryFrom<String> for Currency {
    type Error = ValidationError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Currency::new(&code)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
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
    fn test_display_strips_trailing_zeros() {
        assert_eq!(Money::new(dec!(807.50)).to_string(), "807.5");
        assert_eq!(Money::new(dec!(10000)).to_string(), "10000");
        assert_eq!(Money::zero().to_string(), "0");
    }

    #[test]
    fn test_arithmetic_is_exact() {
        let a = Money::new(dec!(0.1));
        let b = Money::new(dec!(0.2));
        assert_eq!((a + b).amount(), dec!(0.3));
        assert_eq!((b - a).amount(), dec!(0.1));
        assert_eq!(Money::new(dec!(5000)).multiply_quantity(2).amount(), dec!(10000));
    }

    #[test]
    fn test_sum() {
        let items = vec![
            Money::new(dec!(10.25)),
            Money::new(dec!(5.50)),
            Money::new(dec!(3.25)),
        ];
        let total: Money = items.iter().sum();
        assert_eq!(total.amount(), dec!(19.00));

        let empty: Vec<Money> = Vec::new();
        assert!(empty.into_iter().sum::<Money>().is_zero());
    }

    #[test]
    fn test_negative_checks() {
        assert!(Money::new(dec!(-0.01)).is_negative());
        assert!(!Money::zero().is_negative());
        assert!(!Money::new(dec!(0.01)).is_negative());
    }

    #[test]
    fn test_round_to_currency() {
        let usd = Currency::usd();
        let jpy = Currency::new("JPY").unwrap();

        assert_eq!(Money::new(dec!(0.125)).round_to(&usd).amount(), dec!(0.13));
        assert_eq!(Money::new(dec!(-0.125)).round_to(&usd).amount(), dec!(-0.13));
        assert_eq!(Money::new(dec!(807.5)).round_to(&jpy).amount(), dec!(808));
    }

    #[test]
    fn test_format() {
        let usd = Currency::usd();
        let jpy = Currency::new("jpy").unwrap();
        let chf = Currency::new("CHF").unwrap();

        assert_eq!(Money::new(dec!(10307.5)).format(&usd), "$10307.50");
        assert_eq!(Money::new(dec!(-5.5)).format(&usd), "-$5.50");
        assert_eq!(Money::zero().format(&usd), "$0.00");
        assert_eq!(Money::new(dec!(807.5)).format(&jpy), "¥808");
        assert_eq!(Money::new(dec!(12)).format(&chf), "CHF 12.00");
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(Percentage::new(dec!(0)).is_some());
        assert!(Percentage::new(dec!(100)).is_some());
        assert!(Percentage::new(dec!(100.01)).is_none());
        assert!(Percentage::new(dec!(-1)).is_none());
    }

    #[test]
    fn test_percentage_of() {
        let five = Percentage::new(dec!(5)).unwrap();
        assert_eq!(five.of(Money::new(dec!(10000))).amount(), dec!(500));
    }

    #[test]
    fn test_percentage_deserialize_rejects_out_of_range() {
        let ok: Percentage = serde_json::from_str("\"8.5\"").unwrap();
        assert_eq!(ok.value(), dec!(8.5));
        assert!(serde_json::from_str::<Percentage>("\"120\"").is_err());
    }

    #[test]
    fn test_currency_validation() {
        assert_eq!(Currency::new(" eur ").unwrap().code(), "EUR");
        assert!(Currency::new("").is_err());
        assert!(Currency::new("US").is_err());
        assert!(Currency::new("U5D").is_err());
    }

    #[test]
    fn test_currency_serde_roundtrip_as_code() {
        let json = serde_json::to_string(&Currency::usd()).unwrap();
        assert_eq!(json, "\"USD\"");
        let back: Currency = serde_json::from_str("\"krw\"").unwrap();
        assert_eq!(back.minor_units(), 0);
    }
}
