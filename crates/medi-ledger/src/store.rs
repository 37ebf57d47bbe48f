use std::sync::RwLock;

use tracing::debug;

use medi_types::{RecordHash, RecordId, Timestamp, UnitId};

use crate::error::LedgerError;
use crate::records::{EventRecord, Record, RecordPayload};
use crate::traits::{ChainReader, ChainWriter};

/// In-memory record store: the single shared mutable resource of the
/// ledger core.
///
/// One `RwLock` guards the sequence, so every mutation is a critical
/// section and the tail a record links to is always the tail it lands
/// behind. Readers see either the pre- or post-mutation state, never a
/// torn record. There is no global instance; callers hold an explicit
/// handle, so independent chains (one per test, per tenant) are cheap.
pub struct ChainStore {
    inner: RwLock<Vec<Record>>,
}

impl ChainStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
        }
    }

    fn read_guard(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Record>>, LedgerError> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write_guard(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<Record>>, LedgerError> {
        self.inner.write().map_err(|_| LedgerError::LockPoisoned)
    }
}

impl Default for ChainStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Timestamp for the next record: strictly after the current tail so a
/// timestamp sort of any sub-chain reproduces insertion order.
fn next_timestamp(last: Option<&Record>) -> Timestamp {
    match last {
        None => Timestamp::now(),
        Some(tail) => tail.timestamp.successor(),
    }
}

impl ChainWriter for ChainStore {
    fn append(&self, payload: RecordPayload) -> Result<Record, LedgerError> {
        let mut records = self.write_guard()?;
        let prev_hash = records.last().map(|r| r.hash);
        let timestamp = next_timestamp(records.last());
        let record = Record::create(payload, prev_hash, timestamp)?;
        debug!(
            index = records.len(),
            hash = %record.hash.short_hex(),
            unit = %record.unit_key(),
            "append record"
        );
        records.push(record.clone());
        Ok(record)
    }

    fn append_entry(&self, event: EventRecord) -> Result<Record, LedgerError> {
        let mut records = self.write_guard()?;
        let prev_hash = records
            .iter()
            .rev()
            .find(|r| r.unit_key() == &event.unit)
            .map(|r| r.hash);
        let timestamp = next_timestamp(records.last());
        let record = Record::create(RecordPayload::Event(event), prev_hash, timestamp)?;
        debug!(
            index = records.len(),
            hash = %record.hash.short_hex(),
            unit = %record.unit_key(),
            "append entry"
        );
        records.push(record.clone());
        Ok(record)
    }

    fn replace_at(&self, index: usize, payload: RecordPayload) -> Result<Record, LedgerError> {
        let mut records = self.write_guard()?;
        let len = records.len();
        let existing = records
            .get(index)
            .ok_or(LedgerError::IndexOutOfRange { index, len })?;

        // Same id, timestamp, link, and stored hash; only the payload
        // changes. See `ChainWriter::replace_at` for the staleness
        // consequence.
        let replacement = Record {
            id: existing.id,
            timestamp: existing.timestamp,
            prev_hash: existing.prev_hash,
            hash: existing.hash,
            payload,
        };
        debug!(index, hash = %replacement.hash.short_hex(), "replace record");
        records[index] = replacement.clone();
        Ok(replacement)
    }

    fn set_all(&self, new_records: Vec<Record>) -> Result<(), LedgerError> {
        let mut records = self.write_guard()?;
        debug!(count = new_records.len(), "hydrate chain");
        *records = new_records;
        Ok(())
    }
}

impl ChainReader for ChainStore {
    fn get(&self, index: usize) -> Result<Option<Record>, LedgerError> {
        Ok(self.read_guard()?.get(index).cloned())
    }

    fn find_by_id(&self, id: &RecordId) -> Result<Option<(usize, Record)>, LedgerError> {
        Ok(self
            .read_guard()?
            .iter()
            .enumerate()
            .find(|(_, r)| &r.id == id)
            .map(|(i, r)| (i, r.clone())))
    }

    fn find(&self, predicate: &dyn Fn(&Record) -> bool) -> Result<Option<Record>, LedgerError> {
        Ok(self.read_guard()?.iter().find(|r| predicate(r)).cloned())
    }

    fn records(&self) -> Result<Vec<Record>, LedgerError> {
        Ok(self.read_guard()?.clone())
    }

    fn sub_chain(&self, unit: &UnitId) -> Result<Vec<Record>, LedgerError> {
        let mut records: Vec<Record> = self
            .read_guard()?
            .iter()
            .filter(|r| r.unit_key() == unit)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }

    fn units(&self) -> Result<Vec<UnitId>, LedgerError> {
        let mut units: Vec<UnitId> = self
            .read_guard()?
            .iter()
            .map(|r| r.unit_key().clone())
            .collect();
        units.sort();
        units.dedup();
        Ok(units)
    }

    fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.read_guard()?.len())
    }

    fn tail_hash(&self) -> Result<Option<RecordHash>, LedgerError> {
        Ok(self.read_guard()?.last().map(|r| r.hash))
    }
}
