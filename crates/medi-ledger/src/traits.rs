use medi_types::{RecordHash, RecordId, UnitId};

use crate::error::LedgerError;
use crate::records::{EventRecord, Record, RecordPayload};

/// Write boundary for chain mutations.
///
/// Implementations must serialize all mutations against each other so
/// that "read the current tail, link to it, append" is one atomic step;
/// two concurrent appends must never link to the same stale tail.
pub trait ChainWriter: Send + Sync {
    /// Append a record linked to the current chain tail (or to nothing
    /// when the chain is empty). Returns the sealed record.
    fn append(&self, payload: RecordPayload) -> Result<Record, LedgerError>;

    /// Append an event linked to the most recent record *of the same
    /// unit*, forming that unit's sub-chain.
    fn append_entry(&self, event: EventRecord) -> Result<Record, LedgerError>;

    /// Replace the payload at `index`, reusing the existing record's id,
    /// timestamp, predecessor link, and stored hash.
    ///
    /// The stored hash is deliberately *not* recomputed: descendants link
    /// to it, and data persisted by earlier versions carries it. The
    /// replaced record's self-hash therefore goes stale relative to its
    /// new payload, and the validator reports it when that position is
    /// hash-checked.
    fn replace_at(&self, index: usize, payload: RecordPayload) -> Result<Record, LedgerError>;

    /// Bulk-replace the whole sequence when hydrating from external
    /// storage. Trusts the source; callers are expected to validate
    /// immediately afterwards.
    fn set_all(&self, records: Vec<Record>) -> Result<(), LedgerError>;
}

/// Read boundary for chain queries.
///
/// Reads may run concurrently with each other and see either the pre- or
/// post-mutation state of an in-flight write, never a torn record.
pub trait ChainReader: Send + Sync {
    fn get(&self, index: usize) -> Result<Option<Record>, LedgerError>;

    /// Locate a record by id; returns its chain position alongside it.
    fn find_by_id(&self, id: &RecordId) -> Result<Option<(usize, Record)>, LedgerError>;

    /// First record matching the predicate, scanning in chain order.
    fn find(&self, predicate: &dyn Fn(&Record) -> bool) -> Result<Option<Record>, LedgerError>;

    /// The whole sequence in chain order.
    fn records(&self) -> Result<Vec<Record>, LedgerError>;

    /// Records for one unit, sorted ascending by timestamp.
    fn sub_chain(&self, unit: &UnitId) -> Result<Vec<Record>, LedgerError>;

    /// Distinct unit keys present in the chain, sorted.
    fn units(&self) -> Result<Vec<UnitId>, LedgerError>;

    fn len(&self) -> Result<usize, LedgerError>;

    fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    /// Hash of the current tail record, `None` when empty.
    fn tail_hash(&self) -> Result<Option<RecordHash>, LedgerError>;
}
