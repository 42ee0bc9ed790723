use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A coerced, typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    /// Canonical enum token.
    Code(String),
    Date(NaiveDate),
    Number(f64),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) | Self::Code(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// True for values that count as "missing" for required-field checks.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(value) | Self::Code(value) if value.trim().is_empty())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) | Self::Code(value) => f.write_str(value),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Number(value) => write!(f, "{value}"),
        }
    }
}
