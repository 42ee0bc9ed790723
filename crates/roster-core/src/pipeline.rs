//! The validation stage: mapping gap check, row validation and duplicate
//! detection, ending in a bucketed [`ValidationOutcome`].

use std::time::Instant;

use roster_map::{check_unique, missing_required};
use roster_model::{ColumnMapping, SourceTable, TenantId};
use roster_validate::{ValidationOutcome, validate_table};
use tracing::{info, info_span};

use crate::dedupe::detect_duplicates;
use crate::error::PipelineError;
use crate::identity::IdentityCipher;
use crate::store::RecordStore;

/// Fails with [`PipelineError::Mapping`] when two columns claim one field,
/// and with [`PipelineError::MappingGap`] when a required field has no
/// mapped column.
pub fn check_mappings(mappings: &[ColumnMapping]) -> Result<(), PipelineError> {
    check_unique(mappings)?;
    let fields = missing_required(mappings);
    if fields.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MappingGap { fields })
    }
}

/// Validates every row of `table` and annotates duplicates.
///
/// Field problems land in each row's errors. Only a mapping gap, a
/// malformed table or a failed duplicate lookup is returned as `Err`.
pub fn validate<S, C>(
    mappings: &[ColumnMapping],
    table: &SourceTable,
    store: &S,
    cipher: &C,
    tenant: &TenantId,
) -> Result<ValidationOutcome, PipelineError>
where
    S: RecordStore + ?Sized,
    C: IdentityCipher + ?Sized,
{
    let span = info_span!("validate", tenant = %tenant, rows = table.row_count());
    let _guard = span.enter();
    let started = Instant::now();

    check_mappings(mappings)?;
    table.check_shape()?;

    let mut rows = validate_table(mappings, table);
    detect_duplicates(store, cipher, tenant, &mut rows).map_err(PipelineError::DuplicateLookup)?;
    let outcome = ValidationOutcome::from_rows(rows);

    info!(
        total = outcome.summary.total,
        valid = outcome.summary.valid,
        errors = outcome.summary.errors,
        duplicates = outcome.summary.duplicates,
        duration_ms = started.elapsed().as_millis(),
        "validation complete"
    );
    Ok(outcome)
}
