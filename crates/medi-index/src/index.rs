use std::collections::BTreeMap;

use tracing::debug;

use medi_ledger::Record;
use medi_types::UnitId;

/// Unit-key → chain-position index.
///
/// Purely in-memory; the owner is responsible for keeping it consistent
/// with the chain (incremental updates on append/replace, full rebuild on
/// hydration) and for synchronizing access. Positions within one unit are
/// kept in ascending chain order.
#[derive(Debug, Default)]
pub struct UnitIndex {
    positions: BTreeMap<UnitId, Vec<usize>>,
}

impl UnitIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the full chain, discarding the previous mapping.
    pub fn rebuild(&mut self, records: &[Record]) {
        self.positions.clear();
        for (position, record) in records.iter().enumerate() {
            self.positions
                .entry(record.unit_key().clone())
                .or_default()
                .push(position);
        }
        debug!(units = self.positions.len(), "rebuilt unit index");
    }

    /// Record that a new record for `unit` landed at `position`.
    pub fn note_append(&mut self, unit: &UnitId, position: usize) {
        self.positions
            .entry(unit.clone())
            .or_default()
            .push(position);
    }

    /// Record that the record at `position` was replaced. A replace that
    /// keeps the unit key is a no-op; one that changes it moves the
    /// position between buckets.
    pub fn note_replace(&mut self, old_unit: &UnitId, new_unit: &UnitId, position: usize) {
        if old_unit == new_unit {
            return;
        }
        if let Some(old_positions) = self.positions.get_mut(old_unit) {
            old_positions.retain(|&p| p != position);
            if old_positions.is_empty() {
                self.positions.remove(old_unit);
            }
        }
        let bucket = self.positions.entry(new_unit.clone()).or_default();
        bucket.push(position);
        bucket.sort_unstable();
    }

    /// Chain positions of `unit`'s records, ascending. Empty when the
    /// unit is unknown.
    pub fn positions(&self, unit: &UnitId) -> &[usize] {
        self.positions.get(unit).map_or(&[], Vec::as_slice)
    }

    /// Position of the unit's first record, if any.
    pub fn first_position(&self, unit: &UnitId) -> Option<usize> {
        self.positions(unit).first().copied()
    }

    pub fn contains(&self, unit: &UnitId) -> bool {
        self.positions.contains_key(unit)
    }

    /// Indexed unit keys in sorted order.
    pub fn units(&self) -> impl Iterator<Item = &UnitId> {
        self.positions.keys()
    }

    /// Number of indexed units.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

#[cfg(test)]
mod tests {
    use medi_ledger::{ChainReader, ChainStore, ChainWriter, RecordPayload, UnitSnapshot};

    use super::*;

    fn registered_snapshot(key: &str) -> RecordPayload {
        let mut snapshot = UnitSnapshot::genesis();
        snapshot.unit = UnitId::new(key).unwrap();
        RecordPayload::Snapshot(snapshot)
    }

    #[test]
    fn new_index_is_empty() {
        let index = UnitIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert!(!index.contains(&UnitId::ephemeral()));
    }

    #[test]
    fn rebuild_maps_every_position() {
        let store = ChainStore::new();
        store.append(registered_snapshot("DRG-A")).unwrap();
        store.append(registered_snapshot("DRG-B")).unwrap();
        store.append(registered_snapshot("DRG-A")).unwrap();

        let mut index = UnitIndex::new();
        index.rebuild(&store.records().unwrap());

        assert_eq!(index.len(), 2);
        assert_eq!(index.positions(&UnitId::new("DRG-A").unwrap()), &[0, 2]);
        assert_eq!(index.positions(&UnitId::new("DRG-B").unwrap()), &[1]);
    }

    #[test]
    fn note_append_extends_a_bucket() {
        let mut index = UnitIndex::new();
        let unit = UnitId::new("DRG-A").unwrap();
        index.note_append(&unit, 0);
        index.note_append(&unit, 4);

        assert_eq!(index.positions(&unit), &[0, 4]);
        assert_eq!(index.first_position(&unit), Some(0));
    }

    #[test]
    fn note_replace_same_unit_is_noop() {
        let mut index = UnitIndex::new();
        let unit = UnitId::new("DRG-A").unwrap();
        index.note_append(&unit, 2);
        index.note_replace(&unit, &unit, 2);
        assert_eq!(index.positions(&unit), &[2]);
    }

    #[test]
    fn note_replace_moves_between_buckets() {
        let mut index = UnitIndex::new();
        let old_unit = UnitId::new("DRG-A").unwrap();
        let new_unit = UnitId::new("DRG-B").unwrap();
        index.note_append(&old_unit, 0);
        index.note_append(&new_unit, 1);

        index.note_replace(&old_unit, &new_unit, 0);

        assert!(!index.contains(&old_unit));
        assert_eq!(index.positions(&new_unit), &[0, 1]);
    }

    #[test]
    fn unknown_unit_yields_empty_slice() {
        let index = UnitIndex::new();
        assert!(index.positions(&UnitId::new("DRG-X").unwrap()).is_empty());
        assert_eq!(index.first_position(&UnitId::new("DRG-X").unwrap()), None);
    }

    #[test]
    fn units_iterate_sorted() {
        let mut index = UnitIndex::new();
        index.note_append(&UnitId::new("DRG-B").unwrap(), 0);
        index.note_append(&UnitId::new("DRG-A").unwrap(), 1);

        let units: Vec<&UnitId> = index.units().collect();
        assert_eq!(units.len(), 2);
        assert!(units[0] < units[1]);
    }

    #[test]
    fn clear_empties_the_index() {
        let mut index = UnitIndex::new();
        index.note_append(&UnitId::new("DRG-A").unwrap(), 0);
        index.clear();
        assert!(index.is_empty());
    }
}
