//! Duplicate detection and import execution for roster reconciliation.
//!
//! The pipeline talks to the outside world through two seams:
//!
//! - [`IdentityCipher`] protects identity values at rest and derives the
//!   deterministic tags used for equality lookup
//! - [`RecordStore`] persists [`StudentRecord`](roster_model::StudentRecord)s
//!   scoped to a tenant
//!
//! [`validate`] runs the validation stage (mapping gap check, row
//! validation, duplicate detection) and [`execute`] applies the resulting
//! rows under a [`DuplicateAction`](roster_model::DuplicateAction).

pub mod dedupe;
pub mod error;
pub mod executor;
pub mod identity;
pub mod memory;
pub mod pipeline;
pub mod store;

pub use dedupe::{DetectionSummary, detect_duplicates};
pub use error::{CipherError, ExecuteError, PipelineError, StoreError};
pub use executor::{ExecuteOptions, ExecutionBatch, execute};
pub use identity::{IdentityCipher, KeyedIdentityCipher, canonical_identity};
pub use memory::MemoryStore;
pub use pipeline::{check_mappings, validate};
pub use store::{NameKey, RecordStore};
