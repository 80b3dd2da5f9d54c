//! Filesystem-safe identifiers derived from storage ids
//!
//! A safe id is the lowercase hex HMAC-SHA256 of the storage id under an
//! application-wide key. The derivation is pure, so records can be located
//! again from nothing but their storage id and the key.

use sha2::{Digest, Sha256};
use std::fmt;

const BLOCK_SIZE: usize = 64;
const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5C;

/// Length in characters of every safe id
pub const SAFE_ID_LEN: usize = 64;

/// A fixed-length hex identifier safe to use as a file name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SafeId(String);

impl SafeId {
    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a safe id found on disk (64 lowercase hex characters)
    pub fn parse(candidate: &str) -> Option<Self> {
        let valid = candidate.len() == SAFE_ID_LEN
            && candidate
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(candidate.to_string()))
    }
}

impl fmt::Display for SafeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives safe ids with a keyed hash
#[derive(Clone)]
pub struct SafeIdGenerator {
    ipad_key: [u8; BLOCK_SIZE],
    opad_key: [u8; BLOCK_SIZE],
}

impl SafeIdGenerator {
    /// Create a generator for the given HMAC key
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        let key = key.as_ref();

        // Keys longer than a block are hashed first
        let key = if key.len() > BLOCK_SIZE {
            Sha256::digest(key).to_vec()
        } else {
            key.to_vec()
        };

        let mut key_padded = [0u8; BLOCK_SIZE];
        key_padded[..key.len()].copy_from_slice(&key);

        let mut ipad_key = [0u8; BLOCK_SIZE];
        let mut opad_key = [0u8; BLOCK_SIZE];
        for i in 0..BLOCK_SIZE {
            ipad_key[i] = key_padded[i] ^ IPAD;
            opad_key[i] = key_padded[i] ^ OPAD;
        }

        Self { ipad_key, opad_key }
    }

    /// Derive the safe id for a storage id
    pub fn derive(&self, storage_id: &str) -> SafeId {
        SafeId(hex::encode(self.hmac_sha256(storage_id.as_bytes())))
    }

    fn hmac_sha256(&self, data: &[u8]) -> [u8; 32] {
        // Inner hash: H(K XOR ipad, data)
        let mut inner_hasher = Sha256::new();
        inner_hasher.update(self.ipad_key);
        inner_hasher.update(data);
        let inner_hash = inner_hasher.finalize();

        // Outer hash: H(K XOR opad, inner_hash)
        let mut outer_hasher = Sha256::new();
        outer_hasher.update(self.opad_key);
        outer_hasher.update(inner_hash);

        let mut digest = [0u8; 32];
        digest.copy_from_slice(&outer_hasher.finalize());
        digest
    }
}

impl fmt::Debug for SafeIdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeIdGenerator")
            .field("key", &"<redacted>")
            .finish()
    }
}
