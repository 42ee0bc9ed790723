//! Column mapping types for source-header-to-target-field mapping.

use serde::{Deserialize, Serialize};

use crate::TargetField;

/// Confidence of an exact pattern match.
pub const CONFIDENCE_EXACT: u8 = 100;
/// Confidence of a substring containment match.
pub const CONFIDENCE_PARTIAL: u8 = 90;
/// Confidence of a fuzzy longest-common-substring match.
pub const CONFIDENCE_FUZZY: u8 = 75;

/// Mapping of one source column to at most one target field.
///
/// Within a single run no two mappings share the same non-null
/// `target_field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    pub source_column: String,
    pub target_field: Option<TargetField>,
    /// 0 to 100.
    pub confidence: u8,
    pub manually_overridden: bool,
}

impl ColumnMapping {
    pub fn unmapped(source_column: impl Into<String>) -> Self {
        Self {
            source_column: source_column.into(),
            target_field: None,
            confidence: 0,
            manually_overridden: false,
        }
    }

    pub fn suggested(source_column: impl Into<String>, field: TargetField, confidence: u8) -> Self {
        Self {
            source_column: source_column.into(),
            target_field: Some(field),
            confidence,
            manually_overridden: false,
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.target_field.is_some()
    }

    pub fn level(&self) -> Option<ConfidenceLevel> {
        ConfidenceLevel::from_score(self.confidence)
    }
}

/// Scoring tier a confidence value falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Fuzzy,
    Partial,
    Exact,
}

impl ConfidenceLevel {
    pub fn from_score(score: u8) -> Option<Self> {
        if score >= CONFIDENCE_EXACT {
            Some(Self::Exact)
        } else if score >= CONFIDENCE_PARTIAL {
            Some(Self::Partial)
        } else if score >= CONFIDENCE_FUZZY {
            Some(Self::Fuzzy)
        } else {
            None
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Exact => "exact pattern match",
            Self::Partial => "partial match - should review",
            Self::Fuzzy => "fuzzy match - needs verification",
        }
    }
}
