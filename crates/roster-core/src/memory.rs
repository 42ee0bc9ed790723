//! In-memory record store with JSON file persistence.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use roster_model::{
    IdentityKey, IdentityTag, NewRecord, RecordId, RecordUpdate, StudentRecord, TenantId,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StoreError;
use crate::store::{NameKey, RecordStore};

/// [`RecordStore`] holding every record in memory.
///
/// The whole store serializes to a single JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    next_id: u64,
    records: Vec<StudentRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a store file, or starts empty when the file does not exist.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if path.exists() {
            Self::load_json(path)
        } else {
            Ok(Self::new())
        }
    }

    pub fn load_json(path: &Path) -> Result<Self, StoreError> {
        let contents = fs::read_to_string(path).map_err(|source| StoreError::Io {
            operation: "read",
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| StoreError::Format {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes the store to `path` through a temp file and rename.
    pub fn save_json(&self, path: &Path) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(self).map_err(|source| StoreError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                operation: "create directory for",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let temp_path = path.with_extension("json.tmp");
        let mut file = File::create(&temp_path).map_err(|source| StoreError::Io {
            operation: "create",
            path: temp_path.clone(),
            source,
        })?;
        file.write_all(&bytes)
            .and_then(|()| file.sync_all())
            .map_err(|source| StoreError::Io {
                operation: "write",
                path: temp_path.clone(),
                source,
            })?;
        fs::rename(&temp_path, path).map_err(|source| StoreError::Io {
            operation: "replace",
            path: path.to_path_buf(),
            source,
        })?;
        info!(records = self.records.len(), path = %path.display(), "saved record store");
        Ok(())
    }

    /// Records owned by `tenant`, in creation order.
    pub fn records<'a>(&'a self, tenant: &'a TenantId) -> impl Iterator<Item = &'a StudentRecord> {
        self.records.iter().filter(move |record| &record.tenant == tenant)
    }

    pub fn get(&self, tenant: &TenantId, id: RecordId) -> Option<&StudentRecord> {
        self.records
            .iter()
            .find(|record| record.id == id && &record.tenant == tenant)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn find_by_identity(
        &self,
        tenant: &TenantId,
        key: IdentityKey,
        tags: &[IdentityTag],
    ) -> Result<Vec<StudentRecord>, StoreError> {
        let wanted: BTreeSet<&IdentityTag> = tags.iter().collect();
        Ok(self
            .records(tenant)
            .filter(|record| {
                record
                    .identity(key)
                    .is_some_and(|identity| wanted.contains(&identity.tag))
            })
            .cloned()
            .collect())
    }

    fn find_by_name_nationality(
        &self,
        tenant: &TenantId,
        keys: &[NameKey],
    ) -> Result<Vec<StudentRecord>, StoreError> {
        let wanted: BTreeSet<&NameKey> = keys.iter().collect();
        Ok(self
            .records(tenant)
            .filter(|record| NameKey::of_record(record).is_some_and(|key| wanted.contains(&key)))
            .cloned()
            .collect())
    }

    fn create(&mut self, tenant: &TenantId, record: NewRecord) -> Result<RecordId, StoreError> {
        self.next_id += 1;
        let id = RecordId::new(self.next_id);
        let now = Utc::now();
        self.records.push(StudentRecord {
            id,
            tenant: tenant.clone(),
            passport: record.passport,
            registration: record.registration,
            attributes: record.attributes,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    fn update(
        &mut self,
        tenant: &TenantId,
        id: RecordId,
        update: RecordUpdate,
    ) -> Result<(), StoreError> {
        let record = self
            .records
            .iter_mut()
            .find(|record| record.id == id && &record.tenant == tenant)
            .ok_or_else(|| StoreError::NotFound {
                tenant: tenant.clone(),
                id,
            })?;
        for (field, value) in update.attributes {
            if field.is_identity() {
                continue;
            }
            record.attributes.insert(field, value);
        }
        record.updated_at = Utc::now();
        Ok(())
    }
}
