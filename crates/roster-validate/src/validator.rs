//! Row validation against the fixed target schema.

use std::collections::BTreeMap;

use roster_model::{ColumnMapping, FieldError, SCHEMA, SourceTable, TargetField, ValidatedRow};
use tracing::debug;

use crate::coerce::coerce;

/// Validates raw rows against a confirmed column mapping.
///
/// Mappings align with row cells by position: the n-th mapping describes
/// the n-th cell. Each target field resolves to the first column that
/// claims it.
#[derive(Debug, Clone)]
pub struct RowValidator {
    columns: BTreeMap<TargetField, usize>,
}

impl RowValidator {
    pub fn new(mappings: &[ColumnMapping]) -> Self {
        let mut columns = BTreeMap::new();
        for (index, mapping) in mappings.iter().enumerate() {
            if let Some(field) = mapping.target_field {
                columns.entry(field).or_insert(index);
            }
        }
        Self { columns }
    }

    /// Source column index bound to a field.
    pub fn column_of(&self, field: TargetField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// Produces one [`ValidatedRow`]; never fails.
    ///
    /// Coercion errors are appended in schema order, followed by required
    /// field errors in schema order. A required field that already failed
    /// coercion is not reported twice.
    pub fn validate(&self, row_index: usize, cells: &[String]) -> ValidatedRow {
        let mut row = ValidatedRow::new(row_index);
        let mut failed = Vec::new();

        for spec in &SCHEMA {
            let Some(&column) = self.columns.get(&spec.field) else {
                continue;
            };
            let raw = cells.get(column).map_or("", String::as_str);
            match coerce(spec, raw) {
                Ok(value) => {
                    row.fields.insert(spec.field, value);
                }
                Err(message) => {
                    row.fields.insert(spec.field, None);
                    row.errors.push(FieldError::new(spec.field, message));
                    failed.push(spec.field);
                }
            }
        }

        for spec in SCHEMA.iter().filter(|spec| spec.required) {
            if failed.contains(&spec.field) {
                continue;
            }
            let present = row.value(spec.field).is_some_and(|value| !value.is_blank());
            if !present {
                row.errors
                    .push(FieldError::new(spec.field, format!("{} is required", spec.label)));
            }
        }

        if row.has_errors() {
            debug!(row = row_index, errors = row.errors.len(), "row failed validation");
        }
        row
    }
}

/// Validates every row of a table in source order.
pub fn validate_table(mappings: &[ColumnMapping], table: &SourceTable) -> Vec<ValidatedRow> {
    let validator = RowValidator::new(mappings);
    table
        .rows
        .iter()
        .enumerate()
        .map(|(index, cells)| validator.validate(index, cells))
        .collect()
}
