use crate::utils::error::{LedgerError, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::HashSet;
use std::hash::Hash;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(LedgerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Lower bound exclusive, upper bound inclusive.
pub fn validate_range_exclusive_min<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value <= min || value > max {
        return Err(LedgerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be greater than {} and at most {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_unique_ids<T: Hash + Eq + std::fmt::Display + Copy>(
    field_name: &str,
    ids: impl IntoIterator<Item = T>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(LedgerError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: id.to_string(),
                reason: "Duplicate id".to_string(),
            });
        }
    }
    Ok(())
}

/// Parses a report boundary. Accepts RFC 3339 or a bare `YYYY-MM-DD`; a bare
/// date covers the whole day (start of day for `start`, last millisecond for `end`).
pub fn parse_date_bound(field_name: &str, value: &str, is_end: bool) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        LedgerError::bad_request(format!(
            "{} must be an RFC 3339 timestamp or YYYY-MM-DD, got '{}'",
            field_name, value
        ))
    })?;

    let time = if is_end {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| LedgerError::internal("invalid time of day"))?;

    Ok(date.and_time(time).and_utc())
}
