//! Price normalization
//!
//! Upstream prices arrive either as JSON numbers or as humanized strings
//! such as `"75.8k"`, `"1,234"`, `"+5k"` or `"- 2.5m"`. Everything is
//! normalized to a truncated `i64`. Anything unrecognized normalizes to 0.

use super::payload::RawPrice;

const THOUSAND: i128 = 1_000;
const MILLION: i128 = 1_000_000;
const BILLION: i128 = 1_000_000_000;

/// Normalize a price, `None` when the encoding is not recognized
pub fn normalize_price(raw: &RawPrice) -> Option<i64> {
    match raw {
        RawPrice::Numeric(value) => truncate(*value),
        RawPrice::Text(text) => parse_humanized(text),
        RawPrice::Other(_) => None,
    }
}

/// Normalize a price, falling back to 0 for unrecognized encodings
pub fn parse_price(raw: &RawPrice) -> i64 {
    normalize_price(raw).unwrap_or(0)
}

fn truncate(value: f64) -> Option<i64> {
    if !value.is_finite() || value >= i64::MAX as f64 || value < i64::MIN as f64 {
        return None;
    }
    Some(value.trunc() as i64)
}

/// Parse `"[+]<number>[k|m|b]"` after dropping commas and whitespace
fn parse_humanized(text: &str) -> Option<i64> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);

    let (number, multiplier) = match cleaned.as_bytes().last()? {
        b'k' | b'K' => (&cleaned[..cleaned.len() - 1], THOUSAND),
        b'm' | b'M' => (&cleaned[..cleaned.len() - 1], MILLION),
        b'b' | b'B' => (&cleaned[..cleaned.len() - 1], BILLION),
        _ => (cleaned, 1),
    };

    let exact = parse_decimal(number).and_then(|(mantissa, scale)| {
        Some(mantissa.checked_mul(multiplier)? / 10i128.checked_pow(scale)?)
    });

    match exact {
        Some(scaled) => i64::try_from(scaled).ok(),
        // Exponent forms like "1e3" and digit runs too long for i128 go through f64
        None => truncate(number.parse::<f64>().ok()? * multiplier as f64),
    }
}

/// Exact decimal parse: `"-12.50"` → `(-1250, 2)`
///
/// Only plain `[-]digits[.digits]` is accepted; keeping the value as an
/// integer mantissa avoids float error before truncation.
fn parse_decimal(text: &str) -> Option<(i128, u32)> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut mantissa: i128 = 0;
    for b in whole.bytes().chain(fraction.bytes()) {
        mantissa = mantissa.checked_mul(10)?.checked_add(i128::from(b - b'0'))?;
    }

    let scale = u32::try_from(fraction.len()).ok()?;
    Some((if negative { -mantissa } else { mantissa }, scale))
}
