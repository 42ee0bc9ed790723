//! Error types for the reconciliation core.

use std::path::PathBuf;

use roster_map::MappingError;
use roster_model::{ModelError, RecordId, TargetField, TenantId};
use thiserror::Error;

/// Failure of a record store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("record {id} not found for tenant {tenant}")]
    NotFound { tenant: TenantId, id: RecordId },

    #[error("failed to {operation} record store file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid record store file: {path}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to build or use the identity cipher.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("identity key is not set: environment variable {0} is missing or empty")]
    MissingKey(String),

    #[error("invalid identity key: {0}")]
    InvalidKey(String),

    #[error("failed to encrypt identity value")]
    Encrypt,

    #[error("failed to decrypt identity value: {0}")]
    Decrypt(String),
}

/// Batch-scoped failure of the validation stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("required fields have no mapped column: {}", format_fields(.fields))]
    MappingGap { fields: Vec<TargetField> },

    #[error("invalid column mapping")]
    Mapping(#[from] MappingError),

    #[error("malformed source table")]
    Table(#[from] ModelError),

    #[error("duplicate lookup failed")]
    DuplicateLookup(#[source] StoreError),
}

/// Fatal failure of the execute stage; no row was attempted.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("record store is unavailable; no rows were imported")]
    StoreUnavailable(#[source] StoreError),
}

fn format_fields(fields: &[TargetField]) -> String {
    fields
        .iter()
        .copied()
        .map(TargetField::label)
        .collect::<Vec<_>>()
        .join(", ")
}
