//! Protection and tagging of identity values.
//!
//! Two different transforms are applied to every passport and registration
//! number:
//!
//! - `protect` encrypts the value for storage with a fresh random nonce, so
//!   the same plaintext never yields the same ciphertext twice
//! - `tag` derives a keyed hash of the canonical plaintext, so the same
//!   plaintext always yields the same tag
//!
//! Duplicate lookup compares tags only. Comparing protected values would
//! never find a match.

use std::env;
use std::fmt;

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use hmac::{Hmac, Mac};
use roster_model::{IdentityTag, ProtectedValue};
use sha2::Sha256;

use crate::error::CipherError;

type HmacSha256 = Hmac<Sha256>;

/// Length of the hex-decoded master key.
pub const MASTER_KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_KEY_LABEL: &[u8] = b"roster/identity/tag/v1";
const SEAL_KEY_LABEL: &[u8] = b"roster/identity/seal/v1";

/// Collaborator that protects identity values and derives lookup tags.
pub trait IdentityCipher {
    /// Encrypts a value for storage. Output is randomized.
    fn protect(&self, plaintext: &str) -> Result<ProtectedValue, CipherError>;

    /// Derives the deterministic lookup tag of a value.
    fn tag(&self, plaintext: &str) -> IdentityTag;
}

/// Normalizes an identity value before tagging.
///
/// Whitespace and hyphens are dropped and letters uppercased, so
/// `"m 1234-567"` and `"M1234567"` are the same identity.
pub fn canonical_identity(plaintext: &str) -> String {
    plaintext
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '-')
        .flat_map(char::to_uppercase)
        .collect()
}

/// [`IdentityCipher`] keyed by a single 32-byte master key.
///
/// Separate sub-keys for tagging and encryption are derived from the master
/// key with HMAC-SHA256.
#[derive(Clone)]
pub struct KeyedIdentityCipher {
    tag_mac: HmacSha256,
    seal: ChaCha20Poly1305,
}

impl KeyedIdentityCipher {
    pub fn from_key(master: &[u8]) -> Result<Self, CipherError> {
        if master.len() != MASTER_KEY_LEN {
            return Err(CipherError::InvalidKey(format!(
                "expected {MASTER_KEY_LEN} bytes, got {}",
                master.len()
            )));
        }
        let tag_key = derive_key(master, TAG_KEY_LABEL)?;
        let seal_key = derive_key(master, SEAL_KEY_LABEL)?;
        let tag_mac = <HmacSha256 as Mac>::new_from_slice(&tag_key)
            .map_err(|err| CipherError::InvalidKey(err.to_string()))?;
        let seal = ChaCha20Poly1305::new_from_slice(&seal_key)
            .map_err(|err| CipherError::InvalidKey(err.to_string()))?;
        Ok(Self { tag_mac, seal })
    }

    /// Builds a cipher from a hex-encoded master key.
    pub fn from_hex(hex_key: &str) -> Result<Self, CipherError> {
        let master = hex::decode(hex_key.trim())
            .map_err(|err| CipherError::InvalidKey(format!("not valid hex: {err}")))?;
        Self::from_key(&master)
    }

    /// Builds a cipher from the hex key held in an environment variable.
    pub fn from_env(var: &str) -> Result<Self, CipherError> {
        match env::var(var) {
            Ok(value) if !value.trim().is_empty() => Self::from_hex(&value),
            _ => Err(CipherError::MissingKey(var.to_string())),
        }
    }

    /// Decrypts a value produced by [`IdentityCipher::protect`].
    pub fn reveal(&self, protected: &ProtectedValue) -> Result<String, CipherError> {
        let bytes = hex::decode(protected.as_str())
            .map_err(|err| CipherError::Decrypt(format!("not valid hex: {err}")))?;
        if bytes.len() <= NONCE_LEN {
            return Err(CipherError::Decrypt("value is truncated".to_string()));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .seal
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Decrypt("authentication failed".to_string()))?;
        String::from_utf8(plaintext).map_err(|err| CipherError::Decrypt(err.to_string()))
    }
}

impl IdentityCipher for KeyedIdentityCipher {
    fn protect(&self, plaintext: &str) -> Result<ProtectedValue, CipherError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .seal
            .encrypt(&nonce, plaintext.trim().as_bytes())
            .map_err(|_| CipherError::Encrypt)?;
        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(ProtectedValue::new(hex::encode(sealed)))
    }

    fn tag(&self, plaintext: &str) -> IdentityTag {
        let mut mac = self.tag_mac.clone();
        mac.update(canonical_identity(plaintext).as_bytes());
        IdentityTag::new(hex::encode(mac.finalize().into_bytes()))
    }
}

impl fmt::Debug for KeyedIdentityCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedIdentityCipher").finish_non_exhaustive()
    }
}

fn derive_key(master: &[u8], label: &[u8]) -> Result<[u8; 32], CipherError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(master)
        .map_err(|err| CipherError::InvalidKey(err.to_string()))?;
    mac.update(label);
    let mut key = [0u8; 32];
    key.copy_from_slice(&mac.finalize().into_bytes());
    Ok(key)
}
