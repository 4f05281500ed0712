//! Currency codes and display formatting of minor-unit amounts.
//!
//! Every stored amount is an integer in the currency's minor unit. Display
//! strings are produced by [`MoneyFormatter`], which knows which currencies
//! have no fractional part. Rounding is half away from zero, so `0.125`
//! renders as `0.13` and `-0.125` as `-0.13`.

use std::collections::HashSet;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Currencies whose minor unit equals their major unit.
pub const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "JPY", "KMF", "KRW", "MGA", "PYG", "RWF", "UGX", "VND", "VUV",
    "XAF", "XOF", "XPF",
];

/// ISO 4217 currency code, always stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Creates a currency code, normalizing it to upper case.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CurrencyCode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Converts minor-unit amounts into display strings.
///
/// Pure and cheap to clone; one instance is shared by all fetchers.
#[derive(Debug, Clone)]
pub struct MoneyFormatter {
    zero_decimal: HashSet<String>,
}

impl MoneyFormatter {
    /// Creates a formatter with the standard zero-decimal currency set.
    pub fn new() -> Self {
        Self::with_zero_decimal_currencies(ZERO_DECIMAL_CURRENCIES.iter().copied())
    }

    /// Creates a formatter with a custom zero-decimal currency set.
    pub fn with_zero_decimal_currencies<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            zero_decimal: codes
                .into_iter()
                .map(|c| CurrencyCode::new(c).0)
                .collect(),
        }
    }

    /// Returns true if the currency renders without decimals.
    pub fn is_zero_decimal(&self, currency: &CurrencyCode) -> bool {
        self.zero_decimal.contains(currency.as_str())
    }

    /// Number of fraction digits used when displaying the currency.
    pub fn precision(&self, currency: &CurrencyCode) -> u32 {
        if self.is_zero_decimal(currency) { 0 } else { 2 }
    }

    /// Converts a minor-unit amount into major units without rounding.
    pub fn to_major(&self, amount: Decimal, currency: &CurrencyCode) -> Decimal {
        if self.is_zero_decimal(currency) {
            amount
        } else {
            amount / Decimal::ONE_HUNDRED
        }
    }

    /// Formats a minor-unit amount at the currency's precision.
    ///
    /// Zero renders as the zero string for the precision (`"0"` or `"0.00"`).
    pub fn format(&self, amount: impl Into<Decimal>, currency: &CurrencyCode) -> String {
        let amount = amount.into();
        let dp = self.precision(currency);

        let major = self
            .to_major(amount, currency)
            .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);

        if major.is_zero() {
            return zero_string(dp);
        }

        format!("{:.*}", dp as usize, major)
    }

    /// Formats an amount followed by the currency code, e.g. `"12.34 USD"`.
    pub fn display(&self, amount: impl Into<Decimal>, currency: &CurrencyCode) -> String {
        format!("{} {}", self.format(amount, currency), currency)
    }

    /// Displays `amount / quantity`, the per-unit price of a line.
    ///
    /// A zero quantity displays the zero string rather than dividing.
    pub fn display_per_unit(&self, amount: i64, quantity: u32, currency: &CurrencyCode) -> String {
        if quantity == 0 {
            return self.display(Decimal::ZERO, currency);
        }
        self.display(
            Decimal::from(amount) / Decimal::from(quantity),
            currency,
        )
    }
}

impl Default for MoneyFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn zero_string(dp: u32) -> String {
    if dp == 0 {
        "0".to_string()
    } else {
        format!("0.{}", "0".repeat(dp as usize))
    }
}

/// Scales a minor-unit amount by `1 + rate`.
///
/// `rate` is used as given; callers decide whether it is a fraction or a
/// percentage. Non-finite rates are treated as zero. Results outside the
/// decimal range fail with [`DomainError::AmountOverflow`].
pub fn scale_by_rate(amount: i64, rate: f64) -> Result<Decimal, DomainError> {
    let factor = Decimal::from_f64(rate)
        .unwrap_or(Decimal::ZERO)
        .checked_add(Decimal::ONE);
    factor
        .and_then(|factor| Decimal::from(amount).checked_mul(factor))
        .ok_or(DomainError::AmountOverflow { amount, rate })
}

/// Returns `round(amount * rate / 100)`, rounding half away from zero.
///
/// Used for per-tax-line amounts, which are rounded line by line.
pub fn percentage_of(amount: i64, rate: f64) -> i64 {
    (amount as f64 * rate / 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd() -> CurrencyCode {
        CurrencyCode::new("usd")
    }

    #[test]
    fn currency_code_is_upper_cased() {
        assert_eq!(CurrencyCode::new(" eur ").as_str(), "EUR");
        let code: CurrencyCode = serde_json::from_str("\"jpy\"").unwrap();
        assert_eq!(code.as_str(), "JPY");
    }

    #[test]
    fn zero_renders_at_currency_precision() {
        let f = MoneyFormatter::new();
        assert_eq!(f.format(0, &usd()), "0.00");
        assert_eq!(f.format(0, &CurrencyCode::new("jpy")), "0");
        for code in ZERO_DECIMAL_CURRENCIES {
            assert_eq!(f.format(0, &CurrencyCode::new(code)), "0");
        }
    }

    #[test]
    fn two_decimal_currency_divides_by_hundred() {
        let f = MoneyFormatter::new();
        assert_eq!(f.format(1234, &usd()), "12.34");
        assert_eq!(f.format(100, &usd()), "1.00");
        assert_eq!(f.format(5, &usd()), "0.05");
        assert_eq!(f.format(-1234, &usd()), "-12.34");
    }

    #[test]
    fn zero_decimal_currency_has_no_separator() {
        let f = MoneyFormatter::new();
        let jpy = CurrencyCode::new("JPY");
        assert_eq!(f.format(1500, &jpy), "1500");
        assert!(!f.format(333, &jpy).contains('.'));
    }

    #[test]
    fn ties_round_half_away_from_zero() {
        let f = MoneyFormatter::new();
        // 0.125 major units: half-to-even would give 0.12
        assert_eq!(f.format(Decimal::new(125, 1), &usd()), "0.13");
        assert_eq!(f.format(Decimal::new(-125, 1), &usd()), "-0.13");
        // 2.5 yen: half-to-even would give 2
        assert_eq!(f.format(Decimal::new(25, 1), &CurrencyCode::new("JPY")), "3");
    }

    #[test]
    fn tiny_negative_amount_renders_as_plain_zero() {
        let f = MoneyFormatter::new();
        assert_eq!(f.format(Decimal::new(-1, 1), &usd()), "0.00");
    }

    #[test]
    fn display_appends_currency_code() {
        let f = MoneyFormatter::new();
        assert_eq!(f.display(1999, &usd()), "19.99 USD");
        assert_eq!(f.display_per_unit(1000, 3, &usd()), "3.33 USD");
        assert_eq!(f.display_per_unit(1000, 0, &usd()), "0.00 USD");
    }

    #[test]
    fn custom_zero_decimal_set() {
        let f = MoneyFormatter::with_zero_decimal_currencies(["usd"]);
        assert_eq!(f.format(1234, &usd()), "1234");
        assert_eq!(f.precision(&CurrencyCode::new("JPY")), 2);
    }

    #[test]
    fn rate_helpers() {
        assert_eq!(scale_by_rate(1000, 0.25).unwrap(), Decimal::from(1250));
        assert_eq!(scale_by_rate(1000, f64::NAN).unwrap(), Decimal::from(1000));
        assert_eq!(percentage_of(1000, 10.0), 100);
        assert_eq!(percentage_of(999, 12.5), 125);
        assert_eq!(percentage_of(1, 50.0), 1);
    }

    #[test]
    fn scale_by_huge_rate_is_an_error() {
        let err = scale_by_rate(i64::MAX, 1e25).unwrap_err();
        assert!(matches!(
            err,
            DomainError::AmountOverflow { amount: i64::MAX, .. }
        ));
        assert!(scale_by_rate(i64::MAX, 0.0).is_ok());
    }
}
