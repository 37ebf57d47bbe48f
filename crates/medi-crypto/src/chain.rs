use medi_types::RecordHash;

/// Accessors every hash-chain participant provides.
pub trait ChainRecord {
    /// The record's stored hash.
    fn record_hash(&self) -> RecordHash;
    /// The stored predecessor hash (`None` for the first record).
    fn prev_hash(&self) -> Option<RecordHash>;
    /// Recompute the record's own hash from its current fields.
    fn computed_hash(&self) -> RecordHash;
}

/// A single discrepancy found while walking a chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkFault {
    /// Position of the offending record in the walked sequence.
    pub index: usize,
    pub kind: LinkFaultKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkFaultKind {
    /// The record's stored hash does not match its recomputed hash
    /// (tampered or stale payload).
    HashMismatch,
    /// The record's `prev_hash` does not match the predecessor's stored
    /// hash (broken link, reordering, or deletion).
    LinkBreak,
}

/// Walk an ordered record sequence and collect every integrity fault.
///
/// Sequences of length 0 or 1 are trivially sound. For each position
/// `i >= 1` the record's own hash is recomputed and its `prev_hash` is
/// compared against the predecessor's stored hash. The first record is
/// linked *to* but never re-hashed itself, matching the chain's append
/// contract (its predecessor is the absent-sentinel).
///
/// Pure: no side effects, never panics, safe to run concurrently with
/// reads. A broken chain is a legitimate result, not an error.
pub fn verify_links<R: ChainRecord>(records: &[R]) -> Vec<LinkFault> {
    let mut faults = Vec::new();
    if records.len() <= 1 {
        return faults;
    }

    for i in 1..records.len() {
        if records[i].computed_hash() != records[i].record_hash() {
            faults.push(LinkFault {
                index: i,
                kind: LinkFaultKind::HashMismatch,
            });
        }
        if records[i].prev_hash() != Some(records[i - 1].record_hash()) {
            faults.push(LinkFault {
                index: i,
                kind: LinkFaultKind::LinkBreak,
            });
        }
    }

    faults
}
