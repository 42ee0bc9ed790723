//! Duplicate detection against existing records.
//!
//! Keys are checked in strict priority order: passport tag, registration
//! tag, then English name plus nationality. Each key issues a single batched
//! lookup, and rows already matched by a higher-priority key are left out
//! of later lookups, so a row always carries its highest-priority match.

use std::collections::BTreeMap;

use roster_model::{
    DuplicateMatch, IdentityKey, IdentityTag, MatchField, StudentRecord, TargetField, TenantId,
    ValidatedRow,
};
use tracing::{debug, info, info_span};

use crate::error::StoreError;
use crate::identity::IdentityCipher;
use crate::store::{NameKey, RecordStore};

/// Matches found per key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionSummary {
    pub checked: usize,
    pub passport: usize,
    pub registration: usize,
    pub name_nationality: usize,
}

impl DetectionSummary {
    pub fn matched(&self) -> usize {
        self.passport + self.registration + self.name_nationality
    }

    fn count(&mut self, field: MatchField, matches: usize) {
        match field {
            MatchField::Passport => self.passport += matches,
            MatchField::Registration => self.registration += matches,
            MatchField::NameNationality => self.name_nationality += matches,
        }
    }
}

/// Annotates rows that duplicate an existing record of `tenant`.
///
/// Rows with validation errors are never looked up. Any previous duplicate
/// annotation is cleared first. A failed lookup aborts the whole pass.
pub fn detect_duplicates<S, C>(
    store: &S,
    cipher: &C,
    tenant: &TenantId,
    rows: &mut [ValidatedRow],
) -> Result<DetectionSummary, StoreError>
where
    S: RecordStore + ?Sized,
    C: IdentityCipher + ?Sized,
{
    let span = info_span!("detect_duplicates", tenant = %tenant, rows = rows.len());
    let _guard = span.enter();

    let mut summary = DetectionSummary::default();
    for row in rows.iter_mut() {
        row.duplicate = None;
    }
    summary.checked = rows.iter().filter(|row| !row.has_errors()).count();

    for key in IdentityKey::PRIORITY {
        let matches = match_identity(store, cipher, tenant, key, rows)?;
        summary.count(key.match_field(), matches);
    }
    let matches = match_name_nationality(store, tenant, rows)?;
    summary.count(MatchField::NameNationality, matches);

    info!(
        checked = summary.checked,
        passport = summary.passport,
        registration = summary.registration,
        name_nationality = summary.name_nationality,
        "duplicate detection complete"
    );
    Ok(summary)
}

/// Indices of rows still eligible for a lookup.
fn open_rows(rows: &[ValidatedRow]) -> impl Iterator<Item = usize> + '_ {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| !row.has_errors() && row.duplicate.is_none())
        .map(|(index, _)| index)
}

fn match_identity<S, C>(
    store: &S,
    cipher: &C,
    tenant: &TenantId,
    key: IdentityKey,
    rows: &mut [ValidatedRow],
) -> Result<usize, StoreError>
where
    S: RecordStore + ?Sized,
    C: IdentityCipher + ?Sized,
{
    let field = key.field();
    let candidates: Vec<(usize, IdentityTag)> = open_rows(rows)
        .filter_map(|index| {
            let value = rows[index].text(field)?.trim();
            (!value.is_empty()).then(|| (index, cipher.tag(value)))
        })
        .collect();
    if candidates.is_empty() {
        return Ok(0);
    }

    let mut tags: Vec<IdentityTag> = candidates.iter().map(|(_, tag)| tag.clone()).collect();
    tags.sort();
    tags.dedup();
    debug!(key = ?key, tags = tags.len(), "identity lookup");

    let records = store.find_by_identity(tenant, key, &tags)?;
    let by_tag = first_by(records, |record| {
        record.identity(key).map(|identity| identity.tag.clone())
    });

    let mut matched = 0;
    for (index, tag) in candidates {
        if let Some(record) = by_tag.get(&tag) {
            rows[index].duplicate = Some(duplicate_of(record, key.match_field()));
            matched += 1;
        }
    }
    Ok(matched)
}

fn match_name_nationality<S>(
    store: &S,
    tenant: &TenantId,
    rows: &mut [ValidatedRow],
) -> Result<usize, StoreError>
where
    S: RecordStore + ?Sized,
{
    let candidates: Vec<(usize, NameKey)> = open_rows(rows)
        .filter_map(|index| {
            let row = &rows[index];
            let key = NameKey::new(
                row.text(TargetField::NameEn)?,
                row.text(TargetField::Nationality)?,
            )?;
            Some((index, key))
        })
        .collect();
    if candidates.is_empty() {
        return Ok(0);
    }

    let mut keys: Vec<NameKey> = candidates.iter().map(|(_, key)| key.clone()).collect();
    keys.sort();
    keys.dedup();
    debug!(keys = keys.len(), "name and nationality lookup");

    let records = store.find_by_name_nationality(tenant, &keys)?;
    let by_key = first_by(records, NameKey::of_record);

    let mut matched = 0;
    for (index, key) in candidates {
        if let Some(record) = by_key.get(&key) {
            rows[index].duplicate = Some(duplicate_of(record, MatchField::NameNationality));
            matched += 1;
        }
    }
    Ok(matched)
}

/// Indexes records by `key_of`, keeping the oldest record per key.
fn first_by<K, F>(mut records: Vec<StudentRecord>, key_of: F) -> BTreeMap<K, StudentRecord>
where
    K: Ord,
    F: Fn(&StudentRecord) -> Option<K>,
{
    records.sort_by_key(|record| record.id);
    let mut index = BTreeMap::new();
    for record in records {
        if let Some(key) = key_of(&record) {
            index.entry(key).or_insert(record);
        }
    }
    index
}

fn duplicate_of(record: &StudentRecord, match_field: MatchField) -> DuplicateMatch {
    DuplicateMatch {
        existing_record_id: record.id,
        existing_display_name: record.display_name().to_string(),
        match_field,
    }
}
