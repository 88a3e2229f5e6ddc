//! Operand parsing and result formatting.

use std::sync::LazyLock;

use regex::Regex;

/// Signed integer or decimal, optional fraction, optional exponent.
///
/// `f64::from_str` alone is too lenient: it also takes `inf`, `NaN` and
/// `infinity`, none of which the form should accept as a number.
static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
        .unwrap_or_else(|e| panic!("numeric operand pattern is invalid: {e}"))
});

/// Strip the ASCII whitespace and NUL bytes a browser form might carry.
#[must_use]
pub fn trim_operand(raw: &str) -> &str {
    raw.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B'))
}

/// Whether `raw`, once trimmed, is a numeric literal.
#[must_use]
pub fn is_numeric(raw: &str) -> bool {
    NUMERIC.is_match(trim_operand(raw))
}

/// Parse a raw form value into an operand.
///
/// Returns `None` when the trimmed input is not numeric. Literals too large
/// for `f64` become infinities, same as the native conversion.
#[must_use]
pub fn parse_operand(raw: &str) -> Option<f64> {
    let trimmed = trim_operand(raw);
    if !NUMERIC.is_match(trimmed) {
        return None;
    }
    trimmed.parse().ok()
}

/// Format a computed result for the result panel.
///
/// Integral values (`floor(x) == x`) get no decimals, everything else
/// exactly four. The integer part is grouped in thousands with `,`.
#[must_use]
pub fn format_result(value: f64) -> String {
    if value.floor() == value {
        return group_thousands(&format!("{value:.0}"));
    }
    // Halves round away from zero, not to even.
    let rounded = (value * 1e4).round() / 1e4;
    group_thousands(&format!("{rounded:.4}"))
}

/// Significant digits kept when a number is written into an equation or
/// a history row.
const DISPLAY_DIGITS: i32 = 14;

/// Short textual form of a number for equations and history rows.
///
/// Keeps 14 significant digits with trailing zeros dropped, so `20 / 3`
/// reads `6.6666666666667` and `0.1 + 0.2` reads `0.3`. Very large or very
/// small magnitudes switch to exponent form (`1.0E+20`, `1.0E-5`).
#[must_use]
pub fn display_number(value: f64) -> String {
    if value.is_nan() {
        return "NAN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_owned();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_owned();
    }

    // `d.ddddddddddddde<exp>`: one digit before the point, 13 after.
    let scientific = format!("{:.13e}", value.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };
    let digits = mantissa.replace('.', "");
    let digits = digits.trim_end_matches('0');
    let sign = if value < 0.0 { "-" } else { "" };
    // Position of the decimal point relative to the first digit.
    let point = exponent + 1;

    if point < -3 || point > DISPLAY_DIGITS {
        let (first, rest) = digits.split_at(1);
        let rest = if rest.is_empty() { "0" } else { rest };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{sign}{first}.{rest}E{exp_sign}{}", exponent.abs());
    }

    let len = digits.len();
    let body = if point <= 0 {
        format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else {
        let point = point.unsigned_abs() as usize;
        if len <= point {
            format!("{digits}{}", "0".repeat(point - len))
        } else {
            format!("{}.{}", &digits[..point], &digits[point..])
        }
    };
    format!("{sign}{body}")
}

fn group_thousands(fixed: &str) -> String {
    let (sign, unsigned) = fixed
        .strip_prefix('-')
        .map_or(("", fixed), |rest| ("-", rest));
    let (int_part, frac_part) = unsigned
        .split_once('.')
        .map_or((unsigned, None), |(int, frac)| (int, Some(frac)));

    // inf, NaN
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return fixed.to_owned();
    }

    // A value that rounds to zero prints without a sign.
    let sign = if unsigned.bytes().all(|b| b == b'0' || b == b'.') {
        ""
    } else {
        sign
    };

    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3);
    grouped.push_str(sign);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}
