//! Validation stage: row validation plus duplicate detection.

use std::cell::Cell;
use std::collections::BTreeMap;

use roster_core::{
    ExecuteOptions, ExecutionBatch, IdentityCipher, KeyedIdentityCipher, MemoryStore, NameKey,
    PipelineError, RecordStore, StoreError, execute, validate,
};
use roster_map::MappingError;
use roster_model::{
    ColumnMapping, DuplicateAction, FieldValue, IdentityKey, IdentityTag, MatchField, NewRecord,
    RecordId, RecordUpdate, SourceTable, StoredIdentity, StudentRecord, TargetField, TenantId,
};

const HEADERS: [&str; 6] = ["Name", "Nationality", "Visa", "Visa Expiry", "Passport", "ARC"];

fn cipher() -> KeyedIdentityCipher {
    KeyedIdentityCipher::from_key(&[42u8; 32]).unwrap()
}

fn tenant() -> TenantId {
    TenantId::new("uni-seoul").unwrap()
}

fn mappings() -> Vec<ColumnMapping> {
    let fields = [
        TargetField::NameEn,
        TargetField::Nationality,
        TargetField::VisaType,
        TargetField::VisaExpiry,
        TargetField::PassportNumber,
        TargetField::RegistrationNumber,
    ];
    HEADERS
        .iter()
        .zip(fields)
        .map(|(header, field)| ColumnMapping::suggested(*header, field, 100))
        .collect()
}

fn table(rows: &[[&str; 6]]) -> SourceTable {
    SourceTable::new(
        HEADERS.iter().map(|h| h.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect(),
    )
}

fn seed(
    store: &mut MemoryStore,
    tenant: &TenantId,
    name: &str,
    passport: Option<&str>,
    registration: Option<&str>,
) -> RecordId {
    let cipher = cipher();
    let identity = |value: Option<&str>| {
        value.map(|v| StoredIdentity {
            protected: cipher.protect(v).unwrap(),
            tag: cipher.tag(v),
        })
    };
    store
        .create(
            tenant,
            NewRecord {
                passport: identity(passport),
                registration: identity(registration),
                attributes: BTreeMap::from([
                    (TargetField::NameEn, FieldValue::Text(name.into())),
                    (TargetField::Nationality, FieldValue::Text("Vietnam".into())),
                ]),
            },
        )
        .unwrap()
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn missing_required_field_is_an_error_row_even_when_it_matches() {
    let mut store = MemoryStore::new();
    seed(&mut store, &tenant(), "An Nguyen", Some("M1234567"), None);

    let table = table(&[["An Nguyen", "Vietnam", "D-2", "", "M1234567", ""]]);
    let outcome = validate(&mappings(), &table, &store, &cipher(), &tenant()).unwrap();

    assert_eq!(outcome.error_rows.len(), 1);
    assert!(outcome.valid_rows.is_empty());
    assert!(outcome.duplicate_rows.is_empty());
    assert_eq!(outcome.error_rows[0].duplicate, None);
    assert_eq!(outcome.error_rows[0].errors[0].message, "Visa Expiry is required");
}

#[test]
fn summary_total_matches_buckets() {
    let mut store = MemoryStore::new();
    seed(&mut store, &tenant(), "An Nguyen", Some("M1234567"), None);

    let table = table(&[
        ["An Nguyen", "Vietnam", "D-2", "2026-02-28", "M1234567", ""],
        ["Bui Thi Lan", "Vietnam", "D4", "45458", "", ""],
        ["", "Mongolia", "D2", "2026-02-28", "", ""],
        ["Bat Erdene", "Mongolia", "visa?", "2026-02-28", "", ""],
    ]);
    let outcome = validate(&mappings(), &table, &store, &cipher(), &tenant()).unwrap();
    let summary = outcome.summary;

    assert_eq!(
        summary.total,
        outcome.valid_rows.len() + outcome.error_rows.len() + outcome.duplicate_rows.len()
    );
    assert_eq!((summary.total, summary.valid, summary.errors, summary.duplicates), (4, 1, 2, 1));
    let error_indexes: Vec<_> = outcome.error_rows.iter().map(|r| r.row_index).collect();
    assert_eq!(error_indexes, vec![2, 3]);
}

// ============================================================================
// Match priority
// ============================================================================

#[test]
fn passport_match_outranks_registration_match() {
    let mut store = MemoryStore::new();
    let by_registration = seed(&mut store, &tenant(), "Reg Holder", None, Some("123456-7890123"));
    let by_passport = seed(&mut store, &tenant(), "Passport Holder", Some("M1234567"), None);

    let table = table(&[[
        "An Nguyen",
        "Vietnam",
        "D2",
        "2026-02-28",
        "M1234567",
        "123456-7890123",
    ]]);
    let outcome = validate(&mappings(), &table, &store, &cipher(), &tenant()).unwrap();

    let duplicate = outcome.duplicate_rows[0].duplicate.as_ref().unwrap();
    assert_eq!(duplicate.match_field, MatchField::Passport);
    assert_eq!(duplicate.existing_record_id, by_passport);
    assert_ne!(duplicate.existing_record_id, by_registration);
    assert_eq!(duplicate.existing_display_name, "Passport Holder");
}

#[test]
fn registration_then_name_fallback() {
    let mut store = MemoryStore::new();
    seed(&mut store, &tenant(), "Reg Holder", None, Some("1234567890123"));
    seed(&mut store, &tenant(), "Bui Thi Lan", None, None);

    let table = table(&[
        ["Someone", "Vietnam", "D2", "2026-02-28", "Z0000000", "123456-7890123"],
        ["  bui thi  LAN ", "VIETNAM", "D2", "2026-02-28", "", ""],
        ["New Student", "Vietnam", "D2", "2026-02-28", "", ""],
    ]);
    let outcome = validate(&mappings(), &table, &store, &cipher(), &tenant()).unwrap();

    let fields: Vec<_> = outcome
        .duplicate_rows
        .iter()
        .map(|r| r.duplicate.as_ref().unwrap().match_field)
        .collect();
    assert_eq!(fields, vec![MatchField::Registration, MatchField::NameNationality]);
    assert_eq!(outcome.valid_rows[0].row_index, 2);
}

#[test]
fn identity_values_match_after_canonicalization() {
    let mut store = MemoryStore::new();
    seed(&mut store, &tenant(), "An Nguyen", Some("M1234567"), None);

    let table = table(&[["Other Name", "Laos", "D2", "2026-02-28", " m 1234-567 ", ""]]);
    let outcome = validate(&mappings(), &table, &store, &cipher(), &tenant()).unwrap();
    assert_eq!(outcome.summary.duplicates, 1);
}

#[test]
fn other_tenants_records_never_match() {
    let mut store = MemoryStore::new();
    let other = TenantId::new("uni-busan").unwrap();
    seed(&mut store, &other, "An Nguyen", Some("M1234567"), None);

    let table = table(&[["An Nguyen", "Vietnam", "D2", "2026-02-28", "M1234567", ""]]);
    let outcome = validate(&mappings(), &table, &store, &cipher(), &tenant()).unwrap();
    assert_eq!(outcome.summary.duplicates, 0);
    assert_eq!(outcome.summary.valid, 1);
}

// ============================================================================
// Batch-scoped failures
// ============================================================================

#[test]
fn unmapped_required_field_is_a_mapping_gap() {
    let mut mappings = mappings();
    mappings[3] = ColumnMapping::unmapped("Visa Expiry");
    let table = table(&[["An", "Vietnam", "D2", "2026-02-28", "", ""]]);

    let err = validate(&mappings, &table, &MemoryStore::new(), &cipher(), &tenant()).unwrap_err();
    match err {
        PipelineError::MappingGap { fields } => assert_eq!(fields, vec![TargetField::VisaExpiry]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn field_claimed_by_two_columns_is_rejected() {
    let mut mappings = mappings();
    mappings[4] = ColumnMapping::suggested("Passport", TargetField::Email, 100);
    mappings[5] = ColumnMapping::suggested("ARC", TargetField::Email, 100);
    let table = table(&[["An", "Vietnam", "D2", "2026-02-28", "a@x.kr", "b@x.kr"]]);

    let err = validate(&mappings, &table, &MemoryStore::new(), &cipher(), &tenant()).unwrap_err();
    match err {
        PipelineError::Mapping(MappingError::FieldClaimedTwice {
            field,
            first,
            second,
        }) => {
            assert_eq!(field, TargetField::Email);
            assert_eq!(first, "Passport");
            assert_eq!(second, "ARC");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ragged_table_is_rejected() {
    let mut table = table(&[["An", "Vietnam", "D2", "2026-02-28", "", ""]]);
    table.rows[0].push("extra".into());
    let err = validate(&mappings(), &table, &MemoryStore::new(), &cipher(), &tenant()).unwrap_err();
    assert!(matches!(err, PipelineError::Table(_)));
}

/// Store whose lookups fail after a number of successful calls.
struct FailingLookups {
    inner: MemoryStore,
    allowed: Cell<usize>,
}

impl RecordStore for FailingLookups {
    fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn find_by_identity(
        &self,
        tenant: &TenantId,
        key: IdentityKey,
        tags: &[IdentityTag],
    ) -> Result<Vec<StudentRecord>, StoreError> {
        if self.allowed.get() == 0 {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        self.allowed.set(self.allowed.get() - 1);
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
fn lookup_failure_aborts_the_whole_pass() {
    let store = FailingLookups {
        inner: MemoryStore::new(),
        allowed: Cell::new(1),
    };
    let table = table(&[
        ["An", "Vietnam", "D2", "2026-02-28", "M1", "ARC1"],
        ["Lan", "Vietnam", "D2", "2026-02-28", "M2", "ARC2"],
    ]);
    let err = validate(&mappings(), &table, &store, &cipher(), &tenant()).unwrap_err();
    match err {
        PipelineError::DuplicateLookup(StoreError::Unavailable(reason)) => {
            assert_eq!(reason, "connection reset");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn no_lookup_is_issued_without_candidates() {
    let store = FailingLookups {
        inner: MemoryStore::new(),
        allowed: Cell::new(0),
    };
    let table = table(&[["An", "Vietnam", "D2", "2026-02-28", "", ""]]);
    let outcome = validate(&mappings(), &table, &store, &cipher(), &tenant()).unwrap();
    assert_eq!(outcome.summary.valid, 1);
}

// ============================================================================
// Concurrency
// ============================================================================

/// Two imports for one tenant that both validate before either executes
/// both see "no duplicate" and both create. This race is accepted.
#[test]
fn concurrent_imports_may_both_create() {
    let mut store = MemoryStore::new();
    let rows = table(&[["An Nguyen", "Vietnam", "D2", "2026-02-28", "M1234567", ""]]);

    let first = validate(&mappings(), &rows, &store, &cipher(), &tenant()).unwrap();
    let second = validate(&mappings(), &rows, &store, &cipher(), &tenant()).unwrap();
    assert_eq!(first.summary.duplicates, 0);
    assert_eq!(second.summary.duplicates, 0);

    let options = ExecuteOptions::new(DuplicateAction::Skip);
    let batch = ExecutionBatch::from_outcome(first);
    execute(&mut store, &cipher(), &tenant(), &batch, options).unwrap();
    let batch = ExecutionBatch::from_outcome(second);
    execute(&mut store, &cipher(), &tenant(), &batch, options).unwrap();

    let tag = cipher().tag("M1234567");
    let same_person = store
        .find_by_identity(&tenant(), IdentityKey::Passport, &[tag])
        .unwrap();
    assert_eq!(same_person.len(), 2);

    let third = validate(&mappings(), &rows, &store, &cipher(), &tenant()).unwrap();
    let duplicate = third.duplicate_rows[0].duplicate.as_ref().unwrap();
    assert_eq!(duplicate.existing_record_id, RecordId::new(1));
}
