//! Bucketed view of a validation run.

use roster_model::{RowClass, ValidatedRow};
use serde::{Deserialize, Serialize};

/// Row counts per bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub valid: usize,
    pub errors: usize,
    pub duplicates: usize,
}

/// Result of the validation stage, rows grouped by classification.
///
/// `summary.total` always equals the sum of the three bucket lengths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub summary: ValidationSummary,
    pub valid_rows: Vec<ValidatedRow>,
    pub error_rows: Vec<ValidatedRow>,
    pub duplicate_rows: Vec<ValidatedRow>,
}

impl ValidationOutcome {
    /// Buckets rows by [`ValidatedRow::classify`], keeping source order
    /// inside each bucket.
    pub fn from_rows(rows: Vec<ValidatedRow>) -> Self {
        let mut outcome = Self::default();
        for row in rows {
            match row.classify() {
                RowClass::Valid => outcome.valid_rows.push(row),
                RowClass::Duplicate => outcome.duplicate_rows.push(row),
                RowClass::Error => outcome.error_rows.push(row),
            }
        }
        outcome.summary = ValidationSummary {
            total: outcome.valid_rows.len() + outcome.error_rows.len() + outcome.duplicate_rows.len(),
            valid: outcome.valid_rows.len(),
            errors: outcome.error_rows.len(),
            duplicates: outcome.duplicate_rows.len(),
        };
        outcome
    }

    /// All rows, sorted back into source order.
    pub fn rows(&self) -> Vec<&ValidatedRow> {
        let mut rows: Vec<_> = self
            .valid_rows
            .iter()
            .chain(&self.error_rows)
            .chain(&self.duplicate_rows)
            .collect();
        rows.sort_by_key(|row| row.row_index);
        rows
    }
}

#[cfg(test)]
mod tests {
    use roster_model::{DuplicateMatch, FieldError, MatchField, RecordId, TargetField};

    use super::*;

    fn duplicate() -> Option<DuplicateMatch> {
        Some(DuplicateMatch {
            existing_record_id: RecordId::new(1),
            existing_display_name: "An".into(),
            match_field: MatchField::Passport,
        })
    }

    #[test]
    fn error_outranks_duplicate() {
        let valid = ValidatedRow::new(0);
        let mut dup = ValidatedRow::new(1);
        dup.duplicate = duplicate();
        let mut both = ValidatedRow::new(2);
        both.duplicate = duplicate();
        both.errors.push(FieldError::new(TargetField::NameEn, "Name (English) is required"));

        let outcome = ValidationOutcome::from_rows(vec![both, dup, valid]);
        assert_eq!(
            outcome.summary,
            ValidationSummary { total: 3, valid: 1, errors: 1, duplicates: 1 }
        );
        assert_eq!(outcome.error_rows[0].row_index, 2);
        let order: Vec<_> = outcome.rows().iter().map(|r| r.row_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn serializes_with_camel_case_buckets() {
        let json = serde_json::to_value(ValidationOutcome::default()).unwrap();
        assert!(json.get("validRows").is_some());
        assert!(json.get("duplicateRows").is_some());
        assert_eq!(json["summary"]["total"], 0);
    }
}
