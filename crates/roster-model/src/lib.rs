//! Data model for registrar roster reconciliation.
//!
//! Every type here is produced fresh per import run. The only values that
//! outlive a run are the [`StudentRecord`]s written into the record store.

pub mod error;
pub mod execution;
pub mod ids;
pub mod mapping;
pub mod record;
pub mod row;
pub mod schema;
pub mod table;
pub mod value;

pub use error::{ModelError, Result};
pub use execution::{DuplicateAction, ExecutionResult, RowFailure, RowStatus};
pub use ids::{RecordId, TenantId};
pub use mapping::{ColumnMapping, ConfidenceLevel};
pub use record::{
    IdentityKey, IdentityTag, NewRecord, ProtectedValue, RecordUpdate, StoredIdentity,
    StudentRecord,
};
pub use row::{DuplicateMatch, FieldError, MatchField, RowClass, ValidatedRow};
pub use schema::{EnumDomain, EnumOption, FieldKind, FieldSpec, SCHEMA, TargetField};
pub use table::SourceTable;
pub use value::FieldValue;
