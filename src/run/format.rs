use rust_decimal::Decimal;

pub(crate) const CURRENCY_SYMBOL: &str = "₹";

/// Format a decimal amount with thousand separators and 2 decimal places.
/// e.g. `1234567.89` → `"₹1,234,567.89"`
pub(crate) fn format_amount(val: Decimal) -> String {
    let body = group_thousands(val.abs());
    if val < Decimal::ZERO {
        format!("-{CURRENCY_SYMBOL}{body}")
    } else {
        format!("{CURRENCY_SYMBOL}{body}")
    }
}

/// Budget remaining, with overspend shown in parentheses: `-200` → `"(₹200.00)"`.
pub(crate) fn format_remaining(val: Decimal) -> String {
    if val < Decimal::ZERO {
        format!("({})", format_amount(val.abs()))
    } else {
        format_amount(val)
    }
}

fn group_thousands(abs: Decimal) -> String {
    let formatted = format!("{abs:.2}");
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");
    format!("{with_commas}.{dec_part}")
}

/// Truncate a string to `max` visible characters, appending "…" if truncated.
/// Safe for multi-byte UTF-8 characters.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let char_count = s.chars().count();
    if char_count <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{truncated}…")
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
