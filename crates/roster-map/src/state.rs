//! Mapping state for the confirm-and-override step.
//!
//! Suggestions from the engine are shown to an operator, who may override
//! any of them before validation proceeds. Validation is blocked while a
//! required field has no column.

use std::collections::BTreeMap;

use roster_model::mapping::CONFIDENCE_EXACT;
use roster_model::{ColumnMapping, ConfidenceLevel, TargetField};
use serde::Serialize;

use crate::engine::MappingEngine;
use crate::error::MappingError;

/// Confirmed-or-pending mappings for one source table, one per header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingState {
    mappings: Vec<ColumnMapping>,
}

impl MappingState {
    pub fn new(mappings: Vec<ColumnMapping>) -> Self {
        Self { mappings }
    }

    /// Runs the engine over `headers` and wraps the result.
    pub fn suggest(engine: &MappingEngine, headers: &[String]) -> Self {
        Self::new(engine.suggest(headers))
    }

    pub fn mappings(&self) -> &[ColumnMapping] {
        &self.mappings
    }

    pub fn into_mappings(self) -> Vec<ColumnMapping> {
        self.mappings
    }

    /// Field mapped from `column`, if any.
    pub fn field_for(&self, column: &str) -> Option<TargetField> {
        self.mappings
            .iter()
            .find(|m| m.source_column == column)
            .and_then(|m| m.target_field)
    }

    /// Column that feeds `field`, if any.
    pub fn column_for(&self, field: TargetField) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| m.target_field == Some(field))
            .map(|m| m.source_column.as_str())
    }

    /// Manually maps `column` to `field`, or unmaps it when `field` is `None`.
    ///
    /// Any other column holding `field` loses it, so each field stays claimed
    /// by at most one column.
    pub fn override_column(
        &mut self,
        column: &str,
        field: Option<TargetField>,
    ) -> Result<(), MappingError> {
        let idx = self
            .mappings
            .iter()
            .position(|m| m.source_column == column)
            .ok_or_else(|| MappingError::ColumnNotFound(column.to_string()))?;
        self.override_index(idx, field)
    }

    /// Same as [`Self::override_column`], addressing the column by position.
    pub fn override_index(
        &mut self,
        idx: usize,
        field: Option<TargetField>,
    ) -> Result<(), MappingError> {
        if idx >= self.mappings.len() {
            return Err(MappingError::ColumnNotFound(format!("#{idx}")));
        }
        if let Some(field) = field {
            for (other_idx, other) in self.mappings.iter_mut().enumerate() {
                if other_idx != idx && other.target_field == Some(field) {
                    other.target_field = None;
                    other.confidence = 0;
                }
            }
        }
        let mapping = &mut self.mappings[idx];
        mapping.target_field = field;
        mapping.confidence = if field.is_some() { CONFIDENCE_EXACT } else { 0 };
        mapping.manually_overridden = true;
        Ok(())
    }

    /// Applies a batch of overrides keyed by source column name.
    pub fn apply_overrides(
        &mut self,
        overrides: &BTreeMap<String, Option<TargetField>>,
    ) -> Result<(), MappingError> {
        for (column, field) in overrides {
            self.override_column(column, *field)?;
        }
        Ok(())
    }

    /// Required fields no column maps to.
    pub fn missing_required(&self) -> Vec<TargetField> {
        missing_required(&self.mappings)
    }

    /// Verifies that no field is claimed by two columns.
    pub fn check_unique(&self) -> Result<(), MappingError> {
        check_unique(&self.mappings)
    }

    pub fn summary(&self) -> MappingSummary {
        let mut by_level = BTreeMap::new();
        for mapping in &self.mappings {
            if mapping.target_field.is_none() {
                continue;
            }
            if let Some(level) = mapping.level() {
                *by_level.entry(level).or_insert(0) += 1;
            }
        }
        let required_total = TargetField::all().filter(|f| f.is_required()).count();
        let missing = self.missing_required().len();
        MappingSummary {
            columns: self.mappings.len(),
            mapped: self.mappings.iter().filter(|m| m.is_mapped()).count(),
            overridden: self
                .mappings
                .iter()
                .filter(|m| m.manually_overridden)
                .count(),
            by_level,
            required_total,
            required_mapped: required_total - missing,
        }
    }
}

/// Fails when two columns claim the same field, naming the first two.
pub fn check_unique(mappings: &[ColumnMapping]) -> Result<(), MappingError> {
    let mut seen: BTreeMap<TargetField, &str> = BTreeMap::new();
    for mapping in mappings {
        let Some(field) = mapping.target_field else {
            continue;
        };
        if let Some(first) = seen.insert(field, &mapping.source_column) {
            return Err(MappingError::FieldClaimedTwice {
                field,
                first: first.to_string(),
                second: mapping.source_column.clone(),
            });
        }
    }
    Ok(())
}

/// Required fields that none of `mappings` targets.
pub fn missing_required(mappings: &[ColumnMapping]) -> Vec<TargetField> {
    TargetField::all()
        .filter(|field| field.is_required())
        .filter(|field| !mappings.iter().any(|m| m.target_field == Some(*field)))
        .collect()
}

/// Summary counts of a mapping state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingSummary {
    pub columns: usize,
    pub mapped: usize,
    pub overridden: usize,
    pub by_level: BTreeMap<ConfidenceLevel, usize>,
    pub required_total: usize,
    pub required_mapped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(headers: &[&str]) -> MappingState {
        let headers: Vec<String> = headers.iter().map(|h| (*h).to_string()).collect();
        MappingState::suggest(&MappingEngine::new(), &headers)
    }

    #[test]
    fn override_moves_field_between_columns() {
        let mut state = state(&["Name", "Full Name (Passport)"]);
        assert_eq!(state.field_for("Name"), Some(TargetField::NameEn));

        state
            .override_column("Full Name (Passport)", Some(TargetField::NameEn))
            .unwrap();

        assert_eq!(state.column_for(TargetField::NameEn), Some("Full Name (Passport)"));
        assert_eq!(state.field_for("Name"), None);
        let moved = &state.mappings()[1];
        assert!(moved.manually_overridden);
        assert_eq!(moved.confidence, 100);
        assert!(state.check_unique().is_ok());
    }

    #[test]
    fn override_to_none_forces_zero_confidence() {
        let mut state = state(&["Visa Type"]);
        state.override_column("Visa Type", None).unwrap();
        let mapping = &state.mappings()[0];
        assert_eq!(mapping.target_field, None);
        assert_eq!(mapping.confidence, 0);
        assert!(mapping.manually_overridden);
    }

    #[test]
    fn unknown_column_override_is_an_error() {
        let mut state = state(&["Visa Type"]);
        assert_eq!(
            state.override_column("Nope", None),
            Err(MappingError::ColumnNotFound("Nope".to_string()))
        );
    }

    #[test]
    fn missing_required_lists_gaps() {
        let state = state(&["Name", "Nationality", "Visa Type"]);
        assert_eq!(state.missing_required(), vec![TargetField::VisaExpiry]);
        let summary = state.summary();
        assert_eq!(summary.required_total, 4);
        assert_eq!(summary.required_mapped, 3);
        assert_eq!(summary.mapped, 3);
    }

    #[test]
    fn check_unique_detects_hand_built_conflicts() {
        let state = MappingState::new(vec![
            ColumnMapping::suggested("A", TargetField::Email, 100),
            ColumnMapping::suggested("B", TargetField::Email, 90),
        ]);
        assert!(matches!(
            state.check_unique(),
            Err(MappingError::FieldClaimedTwice { .. })
        ));
    }
}
