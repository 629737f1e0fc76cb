use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate, Utc};

pub fn now_utc() -> i64 {
    Utc::now().timestamp()
}

pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("date cannot be empty"));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid date format: expected YYYY-MM-DD"))
}

/// `--telegram ""` style arguments clear the field.
pub fn normalize_optional_value(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
