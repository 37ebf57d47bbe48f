use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Chain digest of a record's canonical fields.
///
/// A `RecordHash` is the BLAKE3 hash of a record's hash pre-image
/// (id, timestamp, predecessor hash, canonical payload). Identical inputs
/// always produce the same `RecordHash`, across platforms and runs.
///
/// The first record in a chain has no predecessor; that is modeled as
/// `Option::<RecordHash>::None`, which displays as the `"0"` sentinel in
/// contexts that need a printable form (see [`RecordHash::SENTINEL`]).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordHash([u8; 32]);

impl RecordHash {
    /// Printable stand-in for "no predecessor", used when an absent
    /// `prev_hash` has to appear in a hash pre-image or display string.
    pub const SENTINEL: &'static str = "0";

    /// Create a `RecordHash` from a pre-computed 32-byte digest.
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for RecordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordHash({})", self.short_hex())
    }
}

impl fmt::Display for RecordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for RecordHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<RecordHash> for [u8; 32] {
    fn from(hash: RecordHash) -> Self {
        hash.0
    }
}

/// Render an optional predecessor hash for a hash pre-image: the hex form
/// when present, the `"0"` sentinel when absent.
pub fn prev_hash_repr(prev: Option<&RecordHash>) -> String {
    match prev {
        Some(hash) => hash.to_hex(),
        None => RecordHash::SENTINEL.to_string(),
    }
}
