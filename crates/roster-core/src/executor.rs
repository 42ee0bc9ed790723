//! Applies validated rows to the record store.
//!
//! Every row is written independently. A failed write is counted and
//! listed in the result; it never stops or rolls back other rows.

use std::collections::BTreeMap;
use std::time::Instant;

use roster_model::{
    DuplicateAction, ExecutionResult, FieldValue, IdentityKey, NewRecord, RecordUpdate,
    RowStatus, StoredIdentity, TargetField, TenantId, ValidatedRow,
};
use roster_validate::ValidationOutcome;
use tracing::{info, info_span, warn};

use crate::error::{CipherError, ExecuteError, StoreError};
use crate::identity::IdentityCipher;
use crate::store::RecordStore;

/// Rows submitted for execution. Error rows are never part of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionBatch {
    pub valid: Vec<ValidatedRow>,
    pub duplicates: Vec<ValidatedRow>,
}

impl ExecutionBatch {
    pub fn new(valid: Vec<ValidatedRow>, duplicates: Vec<ValidatedRow>) -> Self {
        Self { valid, duplicates }
    }

    /// Takes the valid and duplicate buckets; error rows are dropped.
    pub fn from_outcome(outcome: ValidationOutcome) -> Self {
        Self::new(outcome.valid_rows, outcome.duplicate_rows)
    }

    pub fn len(&self) -> usize {
        self.valid.len() + self.duplicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    pub action: DuplicateAction,
    /// No further rows are submitted once this instant has passed.
    pub deadline: Option<Instant>,
}

impl ExecuteOptions {
    pub fn new(action: DuplicateAction) -> Self {
        Self {
            action,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

#[derive(Debug, thiserror::Error)]
enum RowError {
    #[error("row has validation errors: {0}")]
    Invalid(String),
    #[error("row has no duplicate match to update")]
    NoMatch,
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Persists a batch and reports per-row outcomes.
///
/// Rows are attempted in source order. The store is health-checked first;
/// an unavailable store is fatal and no row is attempted.
pub fn execute<S, C>(
    store: &mut S,
    cipher: &C,
    tenant: &TenantId,
    batch: &ExecutionBatch,
    options: ExecuteOptions,
) -> Result<ExecutionResult, ExecuteError>
where
    S: RecordStore + ?Sized,
    C: IdentityCipher + ?Sized,
{
    let span = info_span!(
        "execute",
        tenant = %tenant,
        rows = batch.len(),
        action = %options.action
    );
    let _guard = span.enter();
    let started = Instant::now();

    store.health_check().map_err(ExecuteError::StoreUnavailable)?;

    let mut rows: Vec<(&ValidatedRow, bool)> = batch
        .valid
        .iter()
        .map(|row| (row, false))
        .chain(batch.duplicates.iter().map(|row| (row, true)))
        .collect();
    rows.sort_by_key(|(row, _)| row.row_index);

    let mut result = ExecutionResult::default();
    for (row, is_duplicate) in rows {
        if options.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            result.stopped_early = true;
            warn!(
                attempted = result.total(),
                remaining = batch.len() - result.total(),
                "deadline reached, stopping"
            );
            break;
        }
        let outcome = if is_duplicate {
            apply_duplicate(store, tenant, row, options.action)
        } else {
            create_row(store, cipher, tenant, row)
        };
        match outcome {
            Ok(status) => result.record(row.row_index, status),
            Err(error) => {
                warn!(row = row.row_index, %error, "row write failed");
                result.record_failure(row.row_index, error.to_string());
            }
        }
    }

    info!(
        imported = result.imported,
        skipped = result.skipped,
        updated = result.updated,
        failed = result.failed,
        stopped_early = result.stopped_early,
        duration_ms = started.elapsed().as_millis(),
        "execution complete"
    );
    Ok(result)
}

fn create_row<S, C>(
    store: &mut S,
    cipher: &C,
    tenant: &TenantId,
    row: &ValidatedRow,
) -> Result<RowStatus, RowError>
where
    S: RecordStore + ?Sized,
    C: IdentityCipher + ?Sized,
{
    ensure_clean(row)?;
    let record = NewRecord {
        passport: stored_identity(cipher, row, IdentityKey::Passport)?,
        registration: stored_identity(cipher, row, IdentityKey::Registration)?,
        attributes: plain_attributes(row),
    };
    store.create(tenant, record)?;
    Ok(RowStatus::Imported)
}

fn apply_duplicate<S>(
    store: &mut S,
    tenant: &TenantId,
    row: &ValidatedRow,
    action: DuplicateAction,
) -> Result<RowStatus, RowError>
where
    S: RecordStore + ?Sized,
{
    ensure_clean(row)?;
    match action {
        DuplicateAction::Skip | DuplicateAction::Manual => Ok(RowStatus::Skipped),
        DuplicateAction::Overwrite => {
            let existing = row.duplicate.as_ref().ok_or(RowError::NoMatch)?;
            let update = RecordUpdate {
                attributes: plain_attributes(row),
            };
            store.update(tenant, existing.existing_record_id, update)?;
            Ok(RowStatus::Updated)
        }
    }
}

fn ensure_clean(row: &ValidatedRow) -> Result<(), RowError> {
    if row.has_errors() {
        return Err(RowError::Invalid(row.error_summary()));
    }
    Ok(())
}

fn stored_identity<C>(
    cipher: &C,
    row: &ValidatedRow,
    key: IdentityKey,
) -> Result<Option<StoredIdentity>, CipherError>
where
    C: IdentityCipher + ?Sized,
{
    let Some(value) = row.text(key.field()).map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    Ok(Some(StoredIdentity {
        protected: cipher.protect(value)?,
        tag: cipher.tag(value),
    }))
}

/// Non-null, non-identity values of a row.
fn plain_attributes(row: &ValidatedRow) -> BTreeMap<TargetField, FieldValue> {
    row.fields
        .iter()
        .filter(|(field, _)| !field.is_identity())
        .filter_map(|(field, value)| Some((*field, value.clone()?)))
        .collect()
}
