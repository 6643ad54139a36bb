//! Canadian-dollar amounts as displayed on invoices and cost reports.
//!
//! Amounts are carried as `f64` dollars end to end; rounding happens only at
//! display time.

use num_format::{Locale, ToFormattedString};

/// Format an amount as `CA$1,234.50` (en-CA grouping, two decimals).
///
/// Negative amounts keep the sign after the currency prefix (`CA$-5.00`).
/// Non-finite input renders as `CA$0.00`.
pub fn format_cad(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("CA${sign}{}.{frac:02}", whole.to_formatted_string(&Locale::en))
}

/// Normalize user-typed numeric input.
///
/// Reads the longest leading decimal number (`"12abc"` is 12, `"1.5 hrs"` is
/// 1.5). Input with no leading number, or a non-finite result, becomes 0.
pub fn parse_amount(input: &str) -> f64 {
    let trimmed = input.trim_start();
    trimmed[..numeric_prefix_len(trimmed)]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Byte length of the leading `[+-]digits[.digits][e[+-]digits]` run.
fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_end = digits_from(end);
    let mut mantissa_end = int_end;
    let mut has_digits = int_end > end;
    if bytes.get(int_end) == Some(&b'.') {
        let frac_end = digits_from(int_end + 1);
        if frac_end > int_end + 1 || has_digits {
            mantissa_end = frac_end;
            has_digits |= frac_end > int_end + 1;
        }
    }
    if !has_digits {
        return 0;
    }

    if matches!(bytes.get(mantissa_end), Some(b'e' | b'E')) {
        let mut exp_start = mantissa_end + 1;
        if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
            exp_start += 1;
        }
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            return exp_end;
        }
    }
    mantissa_end
}
