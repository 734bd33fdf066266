//! Checks applied to user-entered text before anything reaches storage.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::db::DATE_FORMAT;
use crate::error::{Result, TrackerError};

fn parse_decimal(text: &str, what: &str) -> Result<Decimal> {
    let trimmed = text.trim();
    Decimal::from_str(trimmed)
        .map_err(|_| TrackerError::invalid_input(format!("'{trimmed}' is not a valid {what}")))
}

/// An expense or payment amount: a decimal strictly greater than zero.
pub(crate) fn parse_amount(text: &str) -> Result<Decimal> {
    let amount = parse_decimal(text, "amount")?;
    if amount <= Decimal::ZERO {
        return Err(TrackerError::invalid_input("amount must be greater than zero"));
    }
    Ok(amount)
}

/// A category budget: a non-negative decimal. Blank means zero.
pub(crate) fn parse_budget(text: &str) -> Result<Decimal> {
    if text.trim().is_empty() {
        return Ok(Decimal::ZERO);
    }
    let budget = parse_decimal(text, "budget")?;
    if budget < Decimal::ZERO {
        return Err(TrackerError::invalid_input("budget cannot be negative"));
    }
    Ok(budget)
}

pub(crate) fn parse_date(text: &str) -> Result<NaiveDate> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| {
        TrackerError::invalid_input(format!("'{trimmed}' is not a date (expected YYYY-MM-DD)"))
    })
}

/// Trimmed text that must not be blank.
pub(crate) fn require_text(field: &str, text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::invalid_input(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
