use tracing::info;

use medi_ledger::{
    ChainReader, ChainStore, ChainValidator, ChainWriter, EventRecord, Record, ValidationReport,
};
use medi_types::UnitId;

use crate::error::ServiceResult;

/// Event-style provenance manager: one shared store partitioned into
/// per-unit sub-chains of immutable event entries.
///
/// Where [`crate::ProvenanceLedger`] rewrites a unit's snapshot in place,
/// this manager only ever appends, so every trail stays fully
/// hash-verifiable end to end.
pub struct EventLedger {
    chain: ChainStore,
}

impl EventLedger {
    /// Create an empty event ledger. Trails need no seed record; a unit's
    /// first event carries the absent-predecessor sentinel.
    pub fn new() -> Self {
        Self {
            chain: ChainStore::new(),
        }
    }

    /// Append one event to its unit's trail, linked to the unit's most
    /// recent entry.
    pub fn record_event(&self, event: EventRecord) -> ServiceResult<Record> {
        let record = self.chain.append_entry(event)?;
        info!(
            unit = %record.unit_key(),
            hash = %record.hash.short_hex(),
            "recorded event"
        );
        Ok(record)
    }

    /// The unit's trail, timestamp-ordered oldest first.
    pub fn trail(&self, unit: &UnitId) -> ServiceResult<Vec<Record>> {
        Ok(self.chain.sub_chain(unit)?)
    }

    /// Validate one unit's trail.
    pub fn validate_unit(&self, unit: &UnitId) -> ServiceResult<ValidationReport> {
        Ok(ChainValidator::validate_unit(&self.chain, unit)?)
    }

    /// Validate every unit's trail in the store.
    pub fn validate_all(&self) -> ServiceResult<Vec<(UnitId, ValidationReport)>> {
        Ok(ChainValidator::validate_all_units(&self.chain)?)
    }

    /// Read-only access to the underlying chain store.
    pub fn store(&self) -> &ChainStore {
        &self.chain
    }
}

impl Default for EventLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use medi_ledger::{EventKind, ViolationKind};
    use medi_types::ActorId;

    use super::*;

    fn event(unit: &UnitId, kind: EventKind, from: &str) -> EventRecord {
        EventRecord {
            unit: unit.clone(),
            kind,
            from_actor: ActorId::new(from).unwrap(),
            to_actor: None,
            location: Some("Plant-A".into()),
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn trail_links_per_unit_and_validates() {
        let ledger = EventLedger::new();
        let unit = UnitId::new("DRG-A").unwrap();

        ledger
            .record_event(event(&unit, EventKind::Registration, "M1"))
            .unwrap();
        ledger
            .record_event(event(&unit, EventKind::Dispatch, "M1"))
            .unwrap();
        ledger
            .record_event(event(&unit, EventKind::Receive, "T1"))
            .unwrap();

        let trail = ledger.trail(&unit).unwrap();
        assert_eq!(trail.len(), 3);
        assert_eq!(trail[0].prev_hash, None);
        assert_eq!(trail[1].prev_hash, Some(trail[0].hash));
        assert_eq!(trail[2].prev_hash, Some(trail[1].hash));

        assert!(ledger.validate_unit(&unit).unwrap().is_valid());
    }

    #[test]
    fn interleaved_units_do_not_cross_link() {
        let ledger = EventLedger::new();
        let unit_a = UnitId::new("DRG-A").unwrap();
        let unit_b = UnitId::new("DRG-B").unwrap();

        ledger
            .record_event(event(&unit_a, EventKind::Registration, "M1"))
            .unwrap();
        ledger
            .record_event(event(&unit_b, EventKind::Registration, "M2"))
            .unwrap();
        ledger
            .record_event(event(&unit_a, EventKind::Sale, "S1"))
            .unwrap();
        ledger
            .record_event(event(&unit_b, EventKind::Flag, "C1"))
            .unwrap();

        let reports = ledger.validate_all().unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|(_, r)| r.is_valid()));

        let trail_b = ledger.trail(&unit_b).unwrap();
        assert_eq!(trail_b.len(), 2);
        assert_eq!(trail_b[1].prev_hash, Some(trail_b[0].hash));
    }

    #[test]
    fn empty_and_singleton_trails_are_valid() {
        let ledger = EventLedger::new();
        let unit = UnitId::new("DRG-A").unwrap();

        assert!(ledger.validate_unit(&unit).unwrap().is_valid());

        ledger
            .record_event(event(&unit, EventKind::Registration, "M1"))
            .unwrap();
        assert!(ledger.validate_unit(&unit).unwrap().is_valid());
    }

    #[test]
    fn metadata_rides_along_and_tampering_is_caught() {
        let ledger = EventLedger::new();
        let unit = UnitId::new("DRG-A").unwrap();

        let mut flagged = event(&unit, EventKind::Flag, "C1");
        flagged
            .metadata
            .insert("reason".into(), "broken seal".into());
        ledger
            .record_event(event(&unit, EventKind::Registration, "M1"))
            .unwrap();
        ledger.record_event(flagged).unwrap();

        // Tamper with the stored metadata without re-hashing.
        let mut records = ledger.store().records().unwrap();
        if let Some(entry) = records[1].as_event() {
            let mut doctored = entry.clone();
            doctored
                .metadata
                .insert("reason".into(), "nothing to see".into());
            records[1].payload = medi_ledger::RecordPayload::Event(doctored);
        }
        ledger.store().set_all(records).unwrap();

        let report = ledger.validate_unit(&unit).unwrap();
        assert!(!report.is_valid());
        assert_eq!(report.violations[0].index, 1);
        assert_eq!(report.violations[0].kind, ViolationKind::HashMismatch);
    }
}
