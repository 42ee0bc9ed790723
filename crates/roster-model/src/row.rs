//! Per-row annotations produced by the validator and the duplicate detector.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{FieldValue, RecordId, TargetField};

/// A validation problem attached to a single field of a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: TargetField,
    pub message: String,
}

impl FieldError {
    pub fn new(field: TargetField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Identity key that produced a duplicate match, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    /// Passport number (deterministic tag).
    Passport,
    /// Alien registration number (deterministic tag).
    Registration,
    /// English name plus nationality, compared as plain text.
    NameNationality,
}

impl MatchField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passport => "passport",
            Self::Registration => "registration",
            Self::NameNationality => "name_nationality",
        }
    }
}

impl fmt::Display for MatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An existing record that a row was found to duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub existing_record_id: RecordId,
    pub existing_display_name: String,
    pub match_field: MatchField,
}

/// Three-way bucket of a row after validation and duplicate detection.
///
/// Priority is error > duplicate > valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowClass {
    Valid,
    Duplicate,
    Error,
}

/// One source row after coercion, validation and duplicate detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRow {
    /// 0-based position in the source table.
    pub row_index: usize,
    pub fields: BTreeMap<TargetField, Option<FieldValue>>,
    pub errors: Vec<FieldError>,
    pub duplicate: Option<DuplicateMatch>,
}

impl ValidatedRow {
    pub fn new(row_index: usize) -> Self {
        Self {
            row_index,
            fields: BTreeMap::new(),
            errors: Vec::new(),
            duplicate: None,
        }
    }

    /// Resolved value of a field; `None` when unmapped or null.
    pub fn value(&self, field: TargetField) -> Option<&FieldValue> {
        self.fields.get(&field).and_then(Option::as_ref)
    }

    pub fn text(&self, field: TargetField) -> Option<&str> {
        self.value(field).and_then(FieldValue::as_text)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn classify(&self) -> RowClass {
        if self.has_errors() {
            RowClass::Error
        } else if self.duplicate.is_some() {
            RowClass::Duplicate
        } else {
            RowClass::Valid
        }
    }

    /// Display name used in reports and duplicate matches.
    pub fn display_name(&self) -> &str {
        self.text(TargetField::NameEn).unwrap_or("")
    }

    /// All error messages joined for single-cell report columns.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|error| error.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}
