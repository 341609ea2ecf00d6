//! Rendering amounts in the user's preferred currency.
//!
//! The crate never converts between currencies; a [`CurrencyOption`] only
//! decides how a number is displayed.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Built-in presets as `(code, symbol, decimal places)`.
const PRESETS: &[(&str, &str, u32)] = &[
    ("USD", "$", 2),
    ("EUR", "€", 2),
    ("GBP", "£", 2),
    ("JPY", "¥", 0),
    ("INR", "₹", 2),
    ("CAD", "C$", 2),
    ("AUD", "A$", 2),
    ("CHF", "Fr.", 2),
];

/// A display currency preference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyOption {
    /// Symbol placed before the number.
    pub symbol: String,
    /// ISO 4217 code.
    pub code: String,
    /// Digits after the decimal point.
    pub decimal_places: u32,
}

impl CurrencyOption {
    /// Creates a custom currency preference.
    #[inline]
    #[must_use]
    pub fn new<S: Into<String>, C: Into<String>>(symbol: S, code: C, decimal_places: u32) -> Self {
        Self {
            symbol: symbol.into(),
            code: code.into(),
            decimal_places,
        }
    }

    /// Looks up a built-in preset by ISO code (case-insensitive).
    #[inline]
    #[must_use]
    pub fn by_code(code: &str) -> Option<Self> {
        PRESETS
            .iter()
            .find(|preset| preset.0.eq_ignore_ascii_case(code.trim()))
            .map(|&(code, symbol, places)| Self::new(symbol, code, places))
    }

    /// Every built-in preset.
    #[inline]
    #[must_use]
    pub fn presets() -> Vec<Self> {
        PRESETS
            .iter()
            .map(|&(code, symbol, places)| Self::new(symbol, code, places))
            .collect()
    }
}

impl Default for CurrencyOption {
    #[inline]
    fn default() -> Self {
        Self::new("$", "USD", 2)
    }
}

/// Formats amounts as `-<symbol>1,234.56`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrencyFormatter {
    /// Active preference.
    currency: CurrencyOption,
}

impl CurrencyFormatter {
    /// Creates a formatter for `currency`.
    #[inline]
    #[must_use]
    pub const fn new(currency: CurrencyOption) -> Self {
        Self { currency }
    }

    /// The active currency preference.
    #[inline]
    #[must_use]
    pub const fn currency(&self) -> &CurrencyOption {
        &self.currency
    }

    /// Renders `amount` with the currency symbol, thousands separators
    /// and exactly `decimal_places` fraction digits.
    ///
    /// Rounds half away from zero. Negative amounts put the sign before
    /// the symbol.
    #[inline]
    #[must_use]
    pub fn format_amount(&self, amount: Decimal) -> String {
        let places = self.currency.decimal_places;
        let rounded =
            amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let digits = format!("{:.*}", places as usize, rounded.abs());
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));
        let mut out = String::with_capacity(digits.len() + 16);
        out.push_str(sign);
        out.push_str(&self.currency.symbol);
        out.push_str(&group_thousands(whole));
        if !fraction.is_empty() {
            out.push('.');
            out.push_str(fraction);
        }
        out
    }

    /// Renders a percentage with one decimal, e.g. `103.2%`.
    #[inline]
    #[must_use]
    pub fn format_percentage(&self, percent: Decimal) -> String {
        let rounded = percent.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        format!("{rounded:.1}%")
    }
}

/// Inserts `,` between groups of three digits.
fn group_thousands(whole: &str) -> String {
    let len = whole.len();
    let mut out = String::with_capacity(len + 8);
    for (idx, digit) in whole.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}
