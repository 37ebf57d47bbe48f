use std::sync::RwLock;

use crate::error::LedgerError;
use crate::records::Record;

/// Contract with the external persistence collaborator (remote database,
/// file store). The core never performs network or file I/O itself; it
/// only defines the shape it needs from storage.
///
/// Implementations must satisfy:
/// - `save_all` / `load_all` preserve every record field verbatim,
///   including exact timestamp precision, so that reloading and
///   re-validating reproduces identical hashes.
/// - `load_all` returns records in chain order.
/// - Failures are reported, never swallowed; the in-memory chain stays
///   authoritative regardless of persistence outcome.
pub trait ChainPersistence: Send + Sync {
    fn load_all(&self) -> Result<Vec<Record>, LedgerError>;

    fn save_all(&self, records: &[Record]) -> Result<(), LedgerError>;
}

/// In-memory persistence backend for tests and embedding.
///
/// Round-trips records through their canonical JSON encoding, so tests
/// exercise the same field-preservation contract a real backend must
/// meet.
pub struct MemoryPersistence {
    stored: RwLock<Vec<u8>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self {
            stored: RwLock::new(b"[]".to_vec()),
        }
    }
}

impl Default for MemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainPersistence for MemoryPersistence {
    fn load_all(&self) -> Result<Vec<Record>, LedgerError> {
        let stored = self
            .stored
            .read()
            .map_err(|_| LedgerError::LockPoisoned)?;
        serde_json::from_slice(&stored).map_err(|e| LedgerError::Persistence(e.to_string()))
    }

    fn save_all(&self, records: &[Record]) -> Result<(), LedgerError> {
        let encoded =
            serde_json::to_vec(records).map_err(|e| LedgerError::Persistence(e.to_string()))?;
        let mut stored = self
            .stored
            .write()
            .map_err(|_| LedgerError::LockPoisoned)?;
        *stored = encoded;
        Ok(())
    }
}
