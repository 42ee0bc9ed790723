//! Per-kind coercion of raw cells into typed values.

use std::sync::LazyLock;

use regex::Regex;
use roster_model::{FieldKind, FieldSpec, FieldValue};

use crate::datetime::parse_date;
use crate::numeric::{format_numeric, parse_f64, parse_percentage};

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("Invalid email regex")
});

const PERCENT_MAX: f64 = 100.0;

/// Coerces one raw cell according to the field's kind.
///
/// Empty (or whitespace-only) cells coerce to `Ok(None)` for every kind;
/// whether that is acceptable is decided by the required-field check.
/// `Err` carries an operator-facing message that cites the raw value.
pub fn coerce(spec: &FieldSpec, raw: &str) -> Result<Option<FieldValue>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = match spec.kind {
        FieldKind::Text => FieldValue::Text(trimmed.to_string()),
        FieldKind::Passthrough => FieldValue::Text(raw.to_string()),
        FieldKind::Enum(domain) => {
            let token = domain
                .resolve(trimmed)
                .ok_or_else(|| format!("invalid {}: '{}'", spec.label, trimmed))?;
            FieldValue::Code(token.to_string())
        }
        FieldKind::Date => {
            let date = parse_date(trimmed)
                .ok_or_else(|| format!("invalid date for {}: '{}'", spec.label, trimmed))?;
            FieldValue::Date(date)
        }
        FieldKind::Percentage => {
            let value = parse_percentage(trimmed)
                .ok_or_else(|| format!("invalid number for {}: '{}'", spec.label, trimmed))?;
            FieldValue::Number(check_range(spec, trimmed, value, PERCENT_MAX)?)
        }
        FieldKind::Scale { max } => {
            let value = parse_f64(trimmed)
                .ok_or_else(|| format!("invalid number for {}: '{}'", spec.label, trimmed))?;
            FieldValue::Number(check_range(spec, trimmed, value, max)?)
        }
        FieldKind::Email => {
            if !EMAIL_REGEX.is_match(trimmed) {
                return Err(format!("invalid email address: '{trimmed}'"));
            }
            FieldValue::Text(trimmed.to_string())
        }
    };
    Ok(Some(value))
}

fn check_range(spec: &FieldSpec, raw: &str, value: f64, max: f64) -> Result<f64, String> {
    if (0.0..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "{} must be between 0 and {}: '{}'",
            spec.label,
            format_numeric(max),
            raw
        ))
    }
}
