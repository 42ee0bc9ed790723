//! Execute stage: policies, per-row isolation and fatal failures.

use std::time::{Duration, Instant};

use roster_core::{
    ExecuteError, ExecuteOptions, ExecutionBatch, IdentityCipher, KeyedIdentityCipher,
    MemoryStore, NameKey, RecordStore, StoreError, execute,
};
use roster_model::{
    DuplicateAction, DuplicateMatch, FieldError, FieldValue, IdentityKey, IdentityTag, MatchField,
    NewRecord, RecordId, RecordUpdate, RowStatus, StudentRecord, TargetField, TenantId,
    ValidatedRow,
};
use roster_validate::ValidationOutcome;

fn cipher() -> KeyedIdentityCipher {
    KeyedIdentityCipher::from_key(&[9u8; 32]).unwrap()
}

fn tenant() -> TenantId {
    TenantId::new("uni-seoul").unwrap()
}

fn row(index: usize, name: &str) -> ValidatedRow {
    let mut row = ValidatedRow::new(index);
    let text = |v: &str| Some(FieldValue::Text(v.to_string()));
    row.fields.insert(TargetField::NameEn, text(name));
    row.fields.insert(TargetField::Nationality, text("Vietnam"));
    row.fields.insert(TargetField::VisaType, Some(FieldValue::Code("D2".into())));
    row.fields.insert(TargetField::Department, None);
    row
}

fn with_passport(mut row: ValidatedRow, passport: &str) -> ValidatedRow {
    row.fields.insert(
        TargetField::PassportNumber,
        Some(FieldValue::Text(passport.into())),
    );
    row
}

fn duplicate_of(mut row: ValidatedRow, id: RecordId) -> ValidatedRow {
    row.duplicate = Some(DuplicateMatch {
        existing_record_id: id,
        existing_display_name: "existing".into(),
        match_field: MatchField::Passport,
    });
    row
}

/// Store with two existing records and a batch of 3 valid + 2 duplicate rows.
fn mixed_batch() -> (MemoryStore, ExecutionBatch) {
    let mut store = MemoryStore::new();
    let first = store.create(&tenant(), NewRecord::default()).unwrap();
    let second = store.create(&tenant(), NewRecord::default()).unwrap();
    let batch = ExecutionBatch::new(
        vec![row(0, "A"), row(2, "C"), row(4, "E")],
        vec![duplicate_of(row(1, "B"), first), duplicate_of(row(3, "D"), second)],
    );
    (store, batch)
}

fn run(
    store: &mut impl RecordStore,
    batch: &ExecutionBatch,
    action: DuplicateAction,
) -> roster_model::ExecutionResult {
    execute(store, &cipher(), &tenant(), batch, ExecuteOptions::new(action)).unwrap()
}

// ============================================================================
// Policies
// ============================================================================

#[test]
fn skip_counts_duplicates_as_skipped() {
    let (mut store, batch) = mixed_batch();
    let result = run(&mut store, &batch, DuplicateAction::Skip);
    assert_eq!(
        (result.imported, result.skipped, result.updated, result.failed),
        (3, 2, 0, 0)
    );
    assert_eq!(store.len(), 5);
    assert_eq!(result.total(), batch.len());
}

#[test]
fn overwrite_updates_duplicates_in_place() {
    let (mut store, batch) = mixed_batch();
    let result = run(&mut store, &batch, DuplicateAction::Overwrite);
    assert_eq!(
        (result.imported, result.skipped, result.updated, result.failed),
        (3, 0, 2, 0)
    );
    assert_eq!(store.len(), 5);
    let updated = store.get(&tenant(), RecordId::new(1)).unwrap();
    assert_eq!(updated.display_name(), "B");
}

#[test]
fn manual_leaves_duplicates_untouched() {
    let (mut store, batch) = mixed_batch();
    let result = run(&mut store, &batch, DuplicateAction::Manual);
    assert_eq!((result.imported, result.skipped, result.updated), (3, 2, 0));
    assert_eq!(store.get(&tenant(), RecordId::new(1)).unwrap().display_name(), "");
}

#[test]
fn statuses_follow_source_order() {
    let (mut store, batch) = mixed_batch();
    let result = run(&mut store, &batch, DuplicateAction::Skip);
    let order: Vec<_> = result.statuses.iter().map(|(index, _)| *index).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
    assert_eq!(result.statuses[1].1, RowStatus::Skipped);
}

#[test]
fn overwrite_never_touches_identity_or_ownership() {
    let mut store = MemoryStore::new();
    let batch = ExecutionBatch::new(vec![with_passport(row(0, "An"), "M1234567")], vec![]);
    run(&mut store, &batch, DuplicateAction::Skip);
    let original = store.get(&tenant(), RecordId::new(1)).unwrap().clone();

    let incoming = duplicate_of(with_passport(row(0, "An Nguyen"), "X7654321"), original.id);
    let batch = ExecutionBatch::new(vec![], vec![incoming]);
    let result = run(&mut store, &batch, DuplicateAction::Overwrite);
    assert_eq!(result.updated, 1);

    let after = store.get(&tenant(), original.id).unwrap();
    assert_eq!(after.passport, original.passport);
    assert_eq!(after.tenant, original.tenant);
    assert_eq!(after.created_at, original.created_at);
    assert_eq!(after.display_name(), "An Nguyen");
    assert!(after.updated_at >= original.updated_at);
}

#[test]
fn created_records_carry_protected_value_and_tag() {
    let mut store = MemoryStore::new();
    let batch = ExecutionBatch::new(vec![with_passport(row(0, "An"), "M1234567")], vec![]);
    run(&mut store, &batch, DuplicateAction::Skip);

    let record = store.get(&tenant(), RecordId::new(1)).unwrap();
    let passport = record.passport.as_ref().unwrap();
    assert_eq!(passport.tag, cipher().tag("M1234567"));
    assert_ne!(passport.protected.as_str(), "M1234567");
    assert_eq!(cipher().reveal(&passport.protected).unwrap(), "M1234567");
    assert!(!record.attributes.contains_key(&TargetField::PassportNumber));
    assert!(!record.attributes.contains_key(&TargetField::Department));
    assert_eq!(record.attribute_text(TargetField::VisaType), Some("D2"));
}

#[test]
fn batch_from_outcome_drops_error_rows() {
    let mut bad = row(1, "B");
    bad.errors.push(FieldError::new(TargetField::VisaExpiry, "Visa Expiry is required"));
    let outcome = ValidationOutcome::from_rows(vec![
        row(0, "A"),
        bad,
        duplicate_of(row(2, "C"), RecordId::new(1)),
    ]);
    let batch = ExecutionBatch::from_outcome(outcome);
    assert_eq!(batch.len(), 2);
    assert_eq!(batch.valid[0].row_index, 0);
    assert_eq!(batch.duplicates[0].row_index, 2);
}

#[test]
fn rows_with_errors_submitted_by_mistake_fail_individually() {
    let mut store = MemoryStore::new();
    let mut bad = row(1, "B");
    bad.errors.push(FieldError::new(TargetField::VisaType, "invalid Visa Type: 'X'"));
    let batch = ExecutionBatch::new(vec![row(0, "A"), bad], vec![]);

    let result = run(&mut store, &batch, DuplicateAction::Skip);
    assert_eq!((result.imported, result.failed), (1, 1));
    assert_eq!(
        result.error_for(1),
        Some("row has validation errors: invalid Visa Type: 'X'")
    );
}

// ============================================================================
// Failures
// ============================================================================

/// Store that rejects writes for one display name and can be taken offline.
struct FlakyStore {
    inner: MemoryStore,
    reject_name: Option<&'static str>,
    offline: bool,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            reject_name: None,
            offline: false,
        }
    }
}

impl RecordStore for FlakyStore {
    fn health_check(&self) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }

    fn find_by_identity(
        &self,
        tenant: &TenantId,
        key: IdentityKey,
        tags: &[IdentityTag],
    ) -> Result<Vec<StudentRecord>, StoreError> {
        self.inner.find_by_identity(tenant, key, tags)
    }

    fn find_by_name_nationality(
        &self,
        tenant: &TenantId,
        keys: &[NameKey],
    ) -> Result<Vec<StudentRecord>, StoreError> {
        self.inner.find_by_name_nationality(tenant, keys)
    }

    fn create(&mut self, tenant: &TenantId, record: NewRecord) -> Result<RecordId, StoreError> {
        let name = record.attributes.get(&TargetField::NameEn).and_then(FieldValue::as_text);
        if self.reject_name.is_some() && name == self.reject_name {
            return Err(StoreError::Unavailable("disk full".into()));
        }
        self.inner.create(tenant, record)
    }

    fn update(
        &mut self,
        tenant: &TenantId,
        id: RecordId,
        update: RecordUpdate,
    ) -> Result<(), StoreError> {
        self.inner.update(tenant, id, update)
    }
}

#[test]
fn one_failed_write_is_isolated() {
    let mut store = FlakyStore::new();
    store.reject_name = Some("Student 6");
    let rows: Vec<_> = (0..10).map(|i| row(i, &format!("Student {i}"))).collect();
    let batch = ExecutionBatch::new(rows, vec![]);

    let result = run(&mut store, &batch, DuplicateAction::Skip);
    assert_eq!((result.imported, result.failed), (9, 1));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].row_index, 6);
    assert_eq!(result.errors[0].error, "record store unavailable: disk full");

    let persisted: Vec<_> = store
        .inner
        .records(&tenant())
        .map(|record| record.display_name().to_string())
        .collect();
    assert_eq!(persisted.len(), 9);
    for i in (0..10).filter(|i| *i != 6) {
        assert!(persisted.contains(&format!("Student {i}")));
    }
}

#[test]
fn update_of_missing_record_fails_that_row_only() {
    let (mut store, mut batch) = mixed_batch();
    batch.duplicates[0] = duplicate_of(row(1, "B"), RecordId::new(99));
    let result = run(&mut store, &batch, DuplicateAction::Overwrite);
    assert_eq!((result.imported, result.updated, result.failed), (3, 1, 1));
    assert_eq!(result.errors[0].row_index, 1);
}

#[test]
fn unavailable_store_aborts_before_any_row() {
    let mut store = FlakyStore::new();
    store.offline = true;
    let batch = ExecutionBatch::new(vec![row(0, "A"), row(1, "B")], vec![]);

    let err = execute(
        &mut store,
        &cipher(),
        &tenant(),
        &batch,
        ExecuteOptions::new(DuplicateAction::Skip),
    )
    .unwrap_err();
    assert!(matches!(err, ExecuteError::StoreUnavailable(_)));
    assert!(store.inner.is_empty());
}

#[test]
fn expired_deadline_stops_submission() {
    let mut store = MemoryStore::new();
    let batch = ExecutionBatch::new(vec![row(0, "A"), row(1, "B")], vec![]);
    let deadline = Instant::now()
        .checked_sub(Duration::from_secs(1))
        .unwrap_or_else(Instant::now);
    let options = ExecuteOptions::new(DuplicateAction::Skip).with_deadline(deadline);

    let result = execute(&mut store, &cipher(), &tenant(), &batch, options).unwrap();
    assert!(result.stopped_early);
    assert_eq!(result.total(), 0);
    assert!(store.is_empty());
}

#[test]
fn generous_deadline_changes_nothing() {
    let (mut store, batch) = mixed_batch();
    let options = ExecuteOptions::new(DuplicateAction::Skip)
        .with_deadline(Instant::now() + Duration::from_secs(3600));
    let result = execute(&mut store, &cipher(), &tenant(), &batch, options).unwrap();
    assert!(!result.stopped_early);
    assert_eq!(result.total(), 5);
}
