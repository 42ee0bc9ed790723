//! The record store seam.

use roster_model::{
    IdentityKey, IdentityTag, NewRecord, RecordId, RecordUpdate, StudentRecord, TargetField,
    TenantId,
};

use crate::error::StoreError;

/// Composite fallback key: English name and nationality compared as plain
/// text, trimmed and case-folded.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameKey {
    name: String,
    nationality: String,
}

impl NameKey {
    /// Returns `None` when either part is blank.
    pub fn new(name: &str, nationality: &str) -> Option<Self> {
        let name = fold(name);
        let nationality = fold(nationality);
        if name.is_empty() || nationality.is_empty() {
            return None;
        }
        Some(Self { name, nationality })
    }

    pub fn of_record(record: &StudentRecord) -> Option<Self> {
        Self::new(
            record.attribute_text(TargetField::NameEn)?,
            record.attribute_text(TargetField::Nationality)?,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nationality(&self) -> &str {
        &self.nationality
    }
}

fn fold(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Persistent storage of student records.
///
/// Every operation is scoped to one tenant; records of other tenants are
/// invisible to lookups and cannot be updated.
pub trait RecordStore {
    /// Verifies the store can serve reads and writes.
    fn health_check(&self) -> Result<(), StoreError>;

    /// Records whose stored tag for `key` equals any of `tags`.
    fn find_by_identity(
        &self,
        tenant: &TenantId,
        key: IdentityKey,
        tags: &[IdentityTag],
    ) -> Result<Vec<StudentRecord>, StoreError>;

    /// Records whose English name and nationality fold to any of `keys`.
    fn find_by_name_nationality(
        &self,
        tenant: &TenantId,
        keys: &[NameKey],
    ) -> Result<Vec<StudentRecord>, StoreError>;

    fn create(&mut self, tenant: &TenantId, record: NewRecord) -> Result<RecordId, StoreError>;

    /// Replaces the given attributes of an existing record.
    ///
    /// Identity fields, ownership and creation time are never changed.
    fn update(
        &mut self,
        tenant: &TenantId,
        id: RecordId,
        update: RecordUpdate,
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_key_folds_case_and_spacing() {
        assert_eq!(
            NameKey::new("  Nguyen   Van An ", "VIETNAM"),
            NameKey::new("nguyen van an", "Vietnam")
        );
        assert_eq!(NameKey::new("An", "  "), None);
        assert_eq!(NameKey::new("", "Vietnam"), None);
    }
}
