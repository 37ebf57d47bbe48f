use medi_crypto::{verify_links, LinkFault, LinkFaultKind};
use medi_types::UnitId;

use crate::error::LedgerError;
use crate::records::Record;
use crate::traits::ChainReader;

/// Result of chain validation.
///
/// A broken chain is a legitimate, expected report state: integrity
/// findings never surface as errors, only reader failures do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub record_count: u64,
    pub hash_chain_valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Position of the offending record in the validated sequence.
    pub index: usize,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// Stored hash does not match the hash recomputed from the record's
    /// fields: tampered or stale payload.
    HashMismatch,
    /// `prev_hash` does not match the predecessor's stored hash: broken
    /// link, reordering, or deletion.
    LinkBreak,
}

/// Chain integrity validator.
///
/// Walks an ordered record sequence — the whole chain or a filtered,
/// timestamp-ordered per-unit sub-chain — and reports every hash and
/// link discrepancy. Validity is a pure function of the sequence content;
/// repeated and concurrent calls are safe.
pub struct ChainValidator;

impl ChainValidator {
    /// Validate an ordered record sequence. Sequences of length 0 or 1
    /// are trivially valid.
    pub fn validate_records(records: &[Record]) -> ValidationReport {
        let faults = verify_links(records);
        let violations: Vec<Violation> = faults
            .iter()
            .map(|fault| describe(fault, records))
            .collect();

        ValidationReport {
            record_count: records.len() as u64,
            hash_chain_valid: violations.is_empty(),
            violations,
        }
    }

    /// Validate the whole chain in store order.
    pub fn validate_chain<R: ChainReader + ?Sized>(
        reader: &R,
    ) -> Result<ValidationReport, LedgerError> {
        Ok(Self::validate_records(&reader.records()?))
    }

    /// Validate one unit's sub-chain, timestamp-ordered.
    pub fn validate_unit<R: ChainReader + ?Sized>(
        reader: &R,
        unit: &UnitId,
    ) -> Result<ValidationReport, LedgerError> {
        Ok(Self::validate_records(&reader.sub_chain(unit)?))
    }

    /// Validate every unit's sub-chain in the store.
    pub fn validate_all_units<R: ChainReader + ?Sized>(
        reader: &R,
    ) -> Result<Vec<(UnitId, ValidationReport)>, LedgerError> {
        let mut reports = Vec::new();
        for unit in reader.units()? {
            let report = Self::validate_unit(reader, &unit)?;
            reports.push((unit, report));
        }
        Ok(reports)
    }
}

fn describe(fault: &LinkFault, records: &[Record]) -> Violation {
    let record = &records[fault.index];
    match fault.kind {
        LinkFaultKind::HashMismatch => Violation {
            index: fault.index,
            kind: ViolationKind::HashMismatch,
            description: format!(
                "record {} at index {}: stored hash does not match recomputed hash",
                record.id.short_id(),
                fault.index
            ),
        },
        LinkFaultKind::LinkBreak => Violation {
            index: fault.index,
            kind: ViolationKind::LinkBreak,
            description: format!(
                "record {} at index {}: prev_hash does not match predecessor",
                record.id.short_id(),
                fault.index
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use medi_types::{ActorId, RecordHash};

    use super::*;
    use crate::records::{EventKind, EventRecord, RecordPayload, UnitSnapshot};
    use crate::store::ChainStore;
    use crate::traits::{ChainReader, ChainWriter};

    fn snapshot_chain(len: usize) -> ChainStore {
        let store = ChainStore::new();
        for _ in 0..len {
            store
                .append(RecordPayload::Snapshot(UnitSnapshot::genesis()))
                .unwrap();
        }
        store
    }

    #[test]
    fn empty_chain_is_valid() {
        let report = ChainValidator::validate_records(&[]);
        assert!(report.is_valid());
        assert_eq!(report.record_count, 0);
    }

    #[test]
    fn singleton_chain_is_valid() {
        let store = snapshot_chain(1);
        let report = ChainValidator::validate_chain(&store).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.record_count, 1);
    }

    #[test]
    fn append_built_chain_is_valid() {
        let store = snapshot_chain(12);
        let report = ChainValidator::validate_chain(&store).unwrap();
        assert!(report.is_valid());
        assert!(report.hash_chain_valid);
    }

    #[test]
    fn tampered_payload_is_reported_with_index() {
        let store = snapshot_chain(5);
        let mut records = store.records().unwrap();
        if let RecordPayload::Snapshot(snapshot) = &mut records[3].payload {
            snapshot.current_location = "diverted".into();
        }
        store.set_all(records).unwrap();

        let report = ChainValidator::validate_chain(&store).unwrap();
        assert!(!report.is_valid());
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].index, 3);
        assert_eq!(report.violations[0].kind, ViolationKind::HashMismatch);
    }

    #[test]
    fn broken_link_is_reported() {
        let store = snapshot_chain(4);
        let mut records = store.records().unwrap();
        records[2].prev_hash = Some(RecordHash::from_digest([0xee; 32]));
        store.set_all(records).unwrap();

        let report = ChainValidator::validate_chain(&store).unwrap();
        assert!(!report.is_valid());
        assert!(report
            .violations
            .iter()
            .any(|v| v.index == 2 && v.kind == ViolationKind::LinkBreak));
    }

    #[test]
    fn deleted_record_is_detected() {
        let store = snapshot_chain(5);
        let mut records = store.records().unwrap();
        records.remove(2);
        store.set_all(records).unwrap();

        let report = ChainValidator::validate_chain(&store).unwrap();
        assert!(!report.is_valid());
        assert!(report
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::LinkBreak));
    }

    #[test]
    fn replaced_payload_goes_stale_but_links_hold() {
        let store = snapshot_chain(3);
        let mut updated = UnitSnapshot::genesis();
        updated.reference_url = "https://medi.app/qr/x".into();
        store
            .replace_at(1, RecordPayload::Snapshot(updated))
            .unwrap();

        let report = ChainValidator::validate_chain(&store).unwrap();
        // The replaced record's own hash is stale; its neighbors' links
        // are intact.
        assert!(!report.is_valid());
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].index, 1);
        assert_eq!(report.violations[0].kind, ViolationKind::HashMismatch);
    }

    #[test]
    fn per_unit_sub_chains_validate_independently() {
        let store = ChainStore::new();
        let unit_a = medi_types::UnitId::new("DRG-A").unwrap();
        let unit_b = medi_types::UnitId::new("DRG-B").unwrap();

        for kind in [EventKind::Registration, EventKind::Dispatch, EventKind::Sale] {
            store
                .append_entry(EventRecord {
                    unit: unit_a.clone(),
                    kind,
                    from_actor: ActorId::new("M1").unwrap(),
                    to_actor: None,
                    location: None,
                    metadata: BTreeMap::new(),
                })
                .unwrap();
            store
                .append_entry(EventRecord {
                    unit: unit_b.clone(),
                    kind,
                    from_actor: ActorId::new("M2").unwrap(),
                    to_actor: None,
                    location: None,
                    metadata: BTreeMap::new(),
                })
                .unwrap();
        }

        assert!(ChainValidator::validate_unit(&store, &unit_a)
            .unwrap()
            .is_valid());
        assert!(ChainValidator::validate_unit(&store, &unit_b)
            .unwrap()
            .is_valid());

        let reports = ChainValidator::validate_all_units(&store).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|(_, r)| r.is_valid()));
    }

    #[test]
    fn violation_descriptions_name_the_record() {
        let store = snapshot_chain(3);
        let mut records = store.records().unwrap();
        let short_id = records[2].id.short_id();
        if let RecordPayload::Snapshot(snapshot) = &mut records[2].payload {
            snapshot.drug_name = "counterfeit".into();
        }
        store.set_all(records).unwrap();

        let report = ChainValidator::validate_chain(&store).unwrap();
        assert!(report.violations[0].description.contains(&short_id));
        assert!(report.violations[0].description.contains("index 2"));
    }
}
