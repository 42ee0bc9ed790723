//! Persisted student records and their protected identity fields.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FieldValue, MatchField, RecordId, TargetField, TenantId};

/// Identity keys usable for equality lookup, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKey {
    Passport,
    Registration,
}

impl IdentityKey {
    pub const PRIORITY: [IdentityKey; 2] = [IdentityKey::Passport, IdentityKey::Registration];

    pub const fn field(self) -> TargetField {
        match self {
            Self::Passport => TargetField::PassportNumber,
            Self::Registration => TargetField::RegistrationNumber,
        }
    }

    pub const fn match_field(self) -> MatchField {
        match self {
            Self::Passport => MatchField::Passport,
            Self::Registration => MatchField::Registration,
        }
    }
}

/// Ciphertext of an identity value, as stored at rest.
///
/// Produced by a randomized scheme: equal plaintexts do not produce equal
/// ciphertexts, so this value is never compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtectedValue(String);

impl ProtectedValue {
    pub fn new(ciphertext: impl Into<String>) -> Self {
        Self(ciphertext.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Deterministic search key derived from an identity plaintext.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityTag(String);

impl IdentityTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity value stored with both its ciphertext and its search tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredIdentity {
    pub protected: ProtectedValue,
    pub tag: IdentityTag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: RecordId,
    pub tenant: TenantId,
    pub passport: Option<StoredIdentity>,
    pub registration: Option<StoredIdentity>,
    /// Every non-identity field with a value.
    pub attributes: BTreeMap<TargetField, FieldValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentRecord {
    pub fn identity(&self, key: IdentityKey) -> Option<&StoredIdentity> {
        match key {
            IdentityKey::Passport => self.passport.as_ref(),
            IdentityKey::Registration => self.registration.as_ref(),
        }
    }

    pub fn attribute_text(&self, field: TargetField) -> Option<&str> {
        self.attributes.get(&field).and_then(FieldValue::as_text)
    }

    pub fn display_name(&self) -> &str {
        self.attribute_text(TargetField::NameEn).unwrap_or("")
    }
}

/// Payload of a record create.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewRecord {
    pub passport: Option<StoredIdentity>,
    pub registration: Option<StoredIdentity>,
    pub attributes: BTreeMap<TargetField, FieldValue>,
}

/// Payload of an in-place update.
///
/// Carries no identity fields and no ownership data; those never change
/// after creation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordUpdate {
    pub attributes: BTreeMap<TargetField, FieldValue>,
}
