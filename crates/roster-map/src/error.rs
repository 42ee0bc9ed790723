//! Error types for mapping operations.

use roster_model::TargetField;
use thiserror::Error;

/// Errors from mapping operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// Column not found in source headers.
    #[error("column not found: {0}")]
    ColumnNotFound(String),
    /// Two columns claim the same target field.
    #[error("field '{field}' is claimed by both '{first}' and '{second}'")]
    FieldClaimedTwice {
        field: TargetField,
        first: String,
        second: String,
    },
}
