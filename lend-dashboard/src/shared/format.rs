//! en-US style number formatters for table cells
//!
//! Output is deterministic for a given input: fixed fraction digits, `,` thousands grouping.

use rust_decimal::prelude::*;

/// Format a fractional rate as a percentage with 2 fraction digits (0.0512 -> "5.12%")
pub fn percent(rate: f64) -> String {
    let pct = if rate.is_finite() { rate * 100.0 } else { 0.0 };
    format!("{}%", group_thousands(&format!("{:.2}", pct)))
}

/// Format a decimal as a whole percentage (0.8 -> "80%")
pub fn whole_percent(fraction: Decimal) -> String {
    let pct = fraction
        .saturating_mul(Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    format!("{}%", group_thousands(&pct.to_string()))
}

/// Format a USD value with 2 fraction digits ($1,234.56)
pub fn usd(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let digits = format!("{:.2}", rounded.abs());
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${}", group_thousands(&digits))
    } else {
        format!("${}", group_thousands(&digits))
    }
}

/// Format a token amount, keeping more precision for sub-unit balances
pub fn token_amount(value: Decimal) -> String {
    let dp = if value.abs() >= Decimal::ONE { 2 } else { 6 };
    let rounded = value
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    group_thousands(&rounded.to_string())
}

/// Insert `,` separators into the integer part of a plain decimal string
fn group_thousands(plain: &str) -> String {
    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}
