//! Price text parsing.
//!
//! Source listings render prices in several local styles:
//! `"12 990 Ft"`, `"12.990 Ft"`, `"€ 1.234,50"`, `"$1,234.50"`, `"45,90 €"`.
//! Currency symbols and letters are discarded, grouping separators are
//! identified by position, and the remainder is parsed as a decimal.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Parses listing price text into a positive decimal.
///
/// Returns `None` when no number is present or the value is zero; a zero
/// price means the listing had no usable price and the item gets flagged.
#[must_use]
pub fn parse_price(text: &str) -> Option<Decimal> {
    // Keep digits and the two candidate separators; spaces (incl. NBSP and
    // narrow NBSP) and currency marks are grouping noise.
    let kept: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | ',') || is_space(*c) || !c.is_ascii())
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ','))
        .collect();
    let kept = kept.trim_end_matches(['.', ',']);
    if kept.is_empty() {
        return None;
    }

    let normalized = normalize_separators(kept)?;
    let value = Decimal::from_str(&normalized).ok()?;
    if value.is_zero() || value.is_sign_negative() {
        None
    } else {
        Some(value.normalize())
    }
}

/// Parses a price and renders it as the catalog's decimal-string form.
#[must_use]
pub fn price_string(text: &str) -> Option<String> {
    parse_price(text).map(|d| d.to_string())
}

fn is_space(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\u{a0}' | '\u{202f}')
}

/// Decides which separator (if any) is the decimal mark and strips the rest.
///
/// - both present: the right-most one is the decimal mark;
/// - one kind, appearing once and followed by one or two digits: decimal mark;
/// - otherwise: grouping separators.
fn normalize_separators(s: &str) -> Option<String> {
    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');

    let decimal_pos = match (last_dot, last_comma) {
        (Some(d), Some(c)) => Some(d.max(c)),
        (Some(p), None) | (None, Some(p)) => {
            let sep = s.as_bytes()[p];
            let occurrences = s.bytes().filter(|&b| b == sep).count();
            let digits_after = s.len() - p - 1;
            if occurrences == 1 && (1..=2).contains(&digits_after) {
                Some(p)
            } else {
                None
            }
        }
        (None, None) => None,
    };

    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        if c.is_ascii_digit() {
            out.push(c);
        } else if Some(i) == decimal_pos {
            out.push('.');
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}
