//! Fixed-point price.
//!
//! Prices are integers in units of 1/10,000 of a currency unit. All book
//! keys and comparisons use this integer form; decimal text only appears
//! at the decoder and writer boundaries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Scale factor between a decimal price and its fixed-point form (4 dp).
pub const PRICE_SCALE: i64 = 10_000;

const SCALE_DIGITS: usize = 4;

/// Fixed-point price at [`PRICE_SCALE`].
///
/// `Price::ZERO` doubles as "absent": the decoder maps empty or unparsable
/// price fields to it and the writer renders it as an empty field.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// The absent/zero price.
    pub const ZERO: Price = Price(0);

    /// Wrap a raw fixed-point value.
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Price(raw)
    }

    /// Raw fixed-point value.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Build from whole currency units (e.g. `Price::from_units(100)` is 100.00).
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Price(units * PRICE_SCALE)
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Parse decimal text into fixed point, truncating digits beyond the
    /// fourth decimal place.
    ///
    /// Plain `[-+]digits[.digits]` text is converted exactly. Anything else
    /// that still reads as a float (exponent form, for instance) is
    /// scaled through `f64` and truncated. Returns `None` for empty or
    /// unreadable input.
    pub fn parse(text: &str) -> Option<Price> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        parse_exact(text).or_else(|| {
            let value: f64 = text.parse().ok()?;
            let scaled = value * PRICE_SCALE as f64;
            if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
                return None;
            }
            Some(Price(scaled.trunc() as i64))
        })
    }

    /// Render for MBP output: empty for zero, otherwise rounded to two
    /// decimals with trailing zeros and a bare trailing point removed.
    ///
    /// ```
    /// use mbp10_reconstructor::Price;
    ///
    /// assert_eq!(Price::from_raw(1_000_000).to_mbp_string(), "100");
    /// assert_eq!(Price::from_raw(1_005_000).to_mbp_string(), "100.5");
    /// assert_eq!(Price::ZERO.to_mbp_string(), "");
    /// ```
    pub fn to_mbp_string(self) -> String {
        if self.0 == 0 {
            return String::new();
        }
        // round half away from zero to hundredths
        let cents = (self.0.unsigned_abs() + 50) / 100;
        let negative = self.0 < 0 && cents != 0;
        let mut out = format!(
            "{}{}.{:02}",
            if negative { "-" } else { "" },
            cents / 100,
            cents % 100
        );
        strip_fraction(&mut out);
        out
    }
}

impl fmt::Display for Price {
    /// Full four-decimal precision, trailing zeros stripped.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let mut out = format!(
            "{}{}.{:04}",
            if self.0 < 0 { "-" } else { "" },
            abs / PRICE_SCALE as u64,
            abs % PRICE_SCALE as u64
        );
        strip_fraction(&mut out);
        f.write_str(&out)
    }
}

/// Free-function form of [`Price::to_mbp_string`].
#[inline]
pub fn format_price(price: Price) -> String {
    price.to_mbp_string()
}

fn strip_fraction(s: &mut String) {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
}

fn parse_exact(text: &str) -> Option<Price> {
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let mut raw: i64 = 0;
    for b in int_part.bytes() {
        raw = raw.checked_mul(10)?.checked_add(i64::from(b - b'0'))?;
    }
    raw = raw.checked_mul(PRICE_SCALE)?;

    let mut frac: i64 = 0;
    let mut digits = 0;
    for b in frac_part.bytes().take(SCALE_DIGITS) {
        frac = frac * 10 + i64::from(b - b'0');
        digits += 1;
    }
    while digits < SCALE_DIGITS {
        frac *= 10;
        digits += 1;
    }
    raw = raw.checked_add(frac)?;

    Some(Price(if negative { -raw } else { raw }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact_decimal() {
        assert_eq!(Price::parse("100.00"), Some(Price::from_raw(1_000_000)));
        assert_eq!(Price::parse("100.5"), Some(Price::from_raw(1_005_000)));
        assert_eq!(Price::parse("0.0001"), Some(Price::from_raw(1)));
        assert_eq!(Price::parse("-3.25"), Some(Price::from_raw(-32_500)));
        assert_eq!(Price::parse("42"), Some(Price::from_units(42)));
    }

    #[test]
    fn test_parse_has_no_float_drift() {
        // 100.07 * 10_000 in f64 is 1000699.999..., which would truncate wrongly
        assert_eq!(Price::parse("100.07"), Some(Price::from_raw(1_000_700)));
    }

    #[test]
    fn test_parse_truncates_extra_digits() {
        assert_eq!(Price::parse("1.23456789"), Some(Price::from_raw(12_345)));
    }

    #[test]
    fn test_parse_exponent_fallback() {
        assert_eq!(Price::parse("1e2"), Some(Price::from_units(100)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Price::parse(""), None);
        assert_eq!(Price::parse("   "), None);
        assert_eq!(Price::parse("abc"), None);
        assert_eq!(Price::parse("."), None);
    }

    #[test]
    fn test_mbp_formatting() {
        assert_eq!(Price::from_units(100).to_mbp_string(), "100");
        assert_eq!(Price::from_raw(1_005_000).to_mbp_string(), "100.5");
        assert_eq!(Price::from_raw(1_000_700).to_mbp_string(), "100.07");
        assert_eq!(Price::ZERO.to_mbp_string(), "");
        assert_eq!(format_price(Price::from_raw(5)), "0");
    }

    #[test]
    fn test_mbp_formatting_rounds_to_cents() {
        assert_eq!(Price::from_raw(1_000_050).to_mbp_string(), "100.01");
        assert_eq!(Price::from_raw(1_000_049).to_mbp_string(), "100");
        assert_eq!(Price::from_raw(999_950).to_mbp_string(), "100");
        assert_eq!(Price::from_raw(-32_500).to_mbp_string(), "-3.25");
    }

    #[test]
    fn test_display_keeps_four_decimals() {
        assert_eq!(Price::from_raw(1_000_049).to_string(), "100.0049");
        assert_eq!(Price::from_units(7).to_string(), "7");
    }

    #[test]
    fn test_ordering_is_integer_ordering() {
        assert!(Price::parse("100.01") > Price::parse("100.0099"));
    }
}
