use medi_types::RecordHash;

/// Domain-separated BLAKE3 digest.
///
/// Each hasher carries a domain tag (e.g. `"medi-record-v1"`) that is
/// prepended to every computation, so records and derived keys with
/// identical bytes can never collide across families.
///
/// This is an integrity digest, not a MAC: no salt, no key. Identical
/// inputs always produce identical output, across platforms and runs.
pub struct ChainHasher {
    domain: &'static str,
}

impl ChainHasher {
    /// Hasher for chain records.
    pub const RECORD: Self = Self {
        domain: "medi-record-v1",
    };
    /// Hasher for unit-key derivations.
    pub const UNIT: Self = Self {
        domain: "medi-unit-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Digest an ordered sequence of canonical field representations.
    ///
    /// Fields are hashed in the order given, each preceded by its length,
    /// so `["ab", "c"]` and `["a", "bc"]` produce different digests.
    pub fn digest_parts(&self, parts: &[&[u8]]) -> RecordHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        RecordHash::from_digest(*hasher.finalize().as_bytes())
    }

    /// Digest a serializable value as canonical JSON.
    ///
    /// Struct fields serialize in declaration order and map fields must be
    /// `BTreeMap`s, so the encoding is deterministic.
    pub fn hash_json<T: serde::Serialize>(&self, value: &T) -> Result<RecordHash, HasherError> {
        let data =
            serde_json::to_vec(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(self.digest_parts(&[&data]))
    }

    /// Verify that `parts` digest to the expected hash.
    pub fn verify(&self, parts: &[&[u8]], expected: &RecordHash) -> bool {
        self.digest_parts(parts) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
