use std::sync::RwLock;

use tracing::{info, warn};

use medi_index::UnitIndex;
use medi_ledger::{
    ChainPersistence, ChainReader, ChainStore, ChainValidator, ChainWriter, Handover, LedgerError,
    Record, RecordPayload, UnitSnapshot, ValidationReport,
};
use medi_types::{ActorId, RecordId, Timestamp, UnitId, UnitStatus};

use crate::error::{ServiceError, ServiceResult};
use crate::registration::UnitRegistration;

/// Snapshot-style provenance manager: one global chain where each unit is
/// represented by a snapshot record that is updated in place as custody
/// changes.
///
/// An explicit owned handle — construct as many independent ledgers as
/// needed (one per test, per tenant); nothing is global. All operations
/// take `&self` and are safe to call from concurrent callers: the chain
/// serializes its own mutations, and the lookup index lives behind its
/// own lock.
pub struct ProvenanceLedger {
    chain: ChainStore,
    index: RwLock<UnitIndex>,
}

impl ProvenanceLedger {
    /// Create a ledger seeded with exactly one genesis record, so every
    /// chain has a non-empty, valid first record.
    pub fn init() -> ServiceResult<Self> {
        let chain = ChainStore::new();
        chain.append(RecordPayload::Snapshot(UnitSnapshot::genesis()))?;
        let mut index = UnitIndex::new();
        index.rebuild(&chain.records()?);
        Ok(Self {
            chain,
            index: RwLock::new(index),
        })
    }

    /// Register a new unit: validates the attribute bundle, appends the
    /// initial snapshot (status `Registered`, holder = registering actor,
    /// location = manufacturing site), and indexes it.
    pub fn register_unit(&self, registration: UnitRegistration) -> ServiceResult<Record> {
        registration.validate()?;
        let unit = unit_key("drug_id", &registration.drug_id)?;
        let holder = actor("registered_by", &registration.registered_by)?;

        let snapshot = UnitSnapshot {
            unit: unit.clone(),
            batch_number: registration.batch_number,
            manufacturer_name: registration.manufacturer_name,
            drug_name: registration.drug_name,
            composition: registration.composition,
            manufacture_date: registration.manufacture_date,
            expiry_date: registration.expiry_date,
            manufacturing_location: registration.manufacturing_location.clone(),
            current_location: registration.manufacturing_location,
            current_holder: holder,
            handover_history: Vec::new(),
            reference_url: String::new(),
            status: UnitStatus::Registered,
        };

        let record = self.chain.append(RecordPayload::Snapshot(snapshot))?;
        self.index_record(&record)?;
        info!(unit = %unit, hash = %record.hash.short_hex(), "registered unit");
        Ok(record)
    }

    /// Record a custody handover: appends to the snapshot's handover
    /// history, moves holder and location, and sets status `InTransit`.
    /// The history is strictly append-only and ordered by insertion.
    pub fn record_handover(
        &self,
        record_id: &RecordId,
        from_entity: &str,
        to_entity: &str,
        location: &str,
        notes: &str,
    ) -> ServiceResult<Record> {
        let (position, mut snapshot) = self.snapshot_at(record_id)?;
        ensure_transition(&snapshot, UnitStatus::InTransit)?;
        let from = actor("from_entity", from_entity)?;
        let to = actor("to_entity", to_entity)?;
        let location = non_empty("location", location)?;

        snapshot.handover_history.push(Handover {
            from_entity: from,
            to_entity: to.clone(),
            timestamp: Timestamp::now(),
            location: location.clone(),
            notes: notes.to_string(),
        });
        snapshot.current_location = location;
        snapshot.current_holder = to;
        snapshot.status = UnitStatus::InTransit;

        let record = self
            .chain
            .replace_at(position, RecordPayload::Snapshot(snapshot))?;
        info!(unit = %record.unit_key(), "recorded handover");
        Ok(record)
    }

    /// Record delivery at the destination: status `Delivered`, holder and
    /// location move to the receiver. No handover sub-record; the
    /// preceding dispatch already carries the custody transfer.
    pub fn record_delivery(
        &self,
        record_id: &RecordId,
        receiver: &str,
        location: &str,
    ) -> ServiceResult<Record> {
        let (position, mut snapshot) = self.snapshot_at(record_id)?;
        ensure_transition(&snapshot, UnitStatus::Delivered)?;
        snapshot.current_holder = actor("receiver", receiver)?;
        snapshot.current_location = non_empty("location", location)?;
        snapshot.status = UnitStatus::Delivered;

        let record = self
            .chain
            .replace_at(position, RecordPayload::Snapshot(snapshot))?;
        info!(unit = %record.unit_key(), "recorded delivery");
        Ok(record)
    }

    /// Record verification by the receiving shop: status `Verified`,
    /// holder and location updated. Verification is a status event, not a
    /// custody transfer, so no handover sub-record is added.
    pub fn record_verification(
        &self,
        record_id: &RecordId,
        verifier: &str,
        location: &str,
    ) -> ServiceResult<Record> {
        let (position, mut snapshot) = self.snapshot_at(record_id)?;
        ensure_transition(&snapshot, UnitStatus::Verified)?;
        snapshot.current_holder = actor("verifier", verifier)?;
        snapshot.current_location = non_empty("location", location)?;
        snapshot.status = UnitStatus::Verified;

        let record = self
            .chain
            .replace_at(position, RecordPayload::Snapshot(snapshot))?;
        info!(unit = %record.unit_key(), "recorded verification");
        Ok(record)
    }

    /// Record a sale to the final customer: a seller→buyer handover noted
    /// as a sale, status `Sold`, holder = buyer.
    pub fn record_sale(
        &self,
        record_id: &RecordId,
        seller: &str,
        buyer: &str,
    ) -> ServiceResult<Record> {
        let (position, mut snapshot) = self.snapshot_at(record_id)?;
        ensure_transition(&snapshot, UnitStatus::Sold)?;
        let seller = actor("seller", seller)?;
        let buyer = actor("buyer", buyer)?;

        snapshot.handover_history.push(Handover {
            from_entity: seller,
            to_entity: buyer.clone(),
            timestamp: Timestamp::now(),
            location: snapshot.current_location.clone(),
            notes: "sale".to_string(),
        });
        snapshot.current_holder = buyer;
        snapshot.status = UnitStatus::Sold;

        let record = self
            .chain
            .replace_at(position, RecordPayload::Snapshot(snapshot))?;
        info!(unit = %record.unit_key(), "recorded sale");
        Ok(record)
    }

    /// Flag a unit as suspicious: absorbing status plus an annotated
    /// handover carrying the reason. Flagging an already-suspicious unit
    /// appends another annotation and leaves the status as is.
    pub fn flag_suspicious(
        &self,
        record_id: &RecordId,
        reporter: &str,
        reason: &str,
    ) -> ServiceResult<Record> {
        let (position, mut snapshot) = self.snapshot_at(record_id)?;
        if snapshot.status == UnitStatus::Sold {
            return Err(ServiceError::InvalidTransition {
                from: UnitStatus::Sold,
                to: UnitStatus::Suspicious,
            });
        }
        let reporter = actor("reporter", reporter)?;

        snapshot.handover_history.push(Handover {
            from_entity: snapshot.current_holder.clone(),
            to_entity: reporter,
            timestamp: Timestamp::now(),
            location: snapshot.current_location.clone(),
            notes: format!("SUSPICIOUS: {reason}"),
        });
        snapshot.status = UnitStatus::Suspicious;

        let record = self
            .chain
            .replace_at(position, RecordPayload::Snapshot(snapshot))?;
        warn!(unit = %record.unit_key(), reason, "unit flagged suspicious");
        Ok(record)
    }

    /// Attach a late-bound reference (e.g. a generated QR link) to an
    /// existing record. The record keeps its id, timestamp, link, and
    /// stored hash.
    pub fn attach_reference(&self, record_id: &RecordId, url: &str) -> ServiceResult<Record> {
        let (position, mut snapshot) = self.snapshot_at(record_id)?;
        snapshot.reference_url = url.to_string();
        let record = self
            .chain
            .replace_at(position, RecordPayload::Snapshot(snapshot))?;
        Ok(record)
    }

    /// First record whose payload carries the unit key; `None` if the
    /// unit was never registered. Index-first, with a chain scan as the
    /// correctness fallback.
    pub fn lookup(&self, unit: &UnitId) -> ServiceResult<Option<Record>> {
        {
            let index = self.index_read()?;
            if let Some(position) = index.first_position(unit) {
                if let Some(record) = self.chain.get(position)? {
                    if record.unit_key() == unit {
                        return Ok(Some(record));
                    }
                }
            }
        }
        Ok(self.chain.find(&|r| r.unit_key() == unit)?)
    }

    /// The unit's handover history, oldest first.
    pub fn unit_history(&self, unit: &UnitId) -> ServiceResult<Vec<Handover>> {
        let record = self
            .lookup(unit)?
            .ok_or_else(|| ServiceError::NotFound(unit.to_string()))?;
        match record.as_snapshot() {
            Some(snapshot) => Ok(snapshot.handover_history.clone()),
            None => Err(ServiceError::NotFound(unit.to_string())),
        }
    }

    /// The unit's current status.
    pub fn status_of(&self, unit: &UnitId) -> ServiceResult<UnitStatus> {
        let record = self
            .lookup(unit)?
            .ok_or_else(|| ServiceError::NotFound(unit.to_string()))?;
        match record.as_snapshot() {
            Some(snapshot) => Ok(snapshot.status),
            None => Err(ServiceError::NotFound(unit.to_string())),
        }
    }

    /// Validate the whole chain. Integrity problems come back in the
    /// report, never as an error.
    pub fn validate(&self) -> ServiceResult<ValidationReport> {
        Ok(ChainValidator::validate_chain(&self.chain)?)
    }

    /// Validate one unit's timestamp-ordered sub-chain.
    pub fn validate_unit(&self, unit: &UnitId) -> ServiceResult<ValidationReport> {
        Ok(ChainValidator::validate_unit(&self.chain, unit)?)
    }

    /// Save the chain through the external persistence collaborator. The
    /// in-memory chain has already advanced and stays authoritative; a
    /// failed save is surfaced, never swallowed.
    pub fn persist_to(&self, persistence: &dyn ChainPersistence) -> ServiceResult<()> {
        let records = self.chain.records()?;
        if let Err(e) = persistence.save_all(&records) {
            warn!(error = %e, "persistence failed; in-memory chain remains authoritative");
            return Err(ServiceError::Ledger(e));
        }
        Ok(())
    }

    /// Replace the chain with externally stored records, rebuild the
    /// index, and validate immediately. Discrepancies are reported — and
    /// logged — not silently ignored; the hydrated records stay in place
    /// for the caller to quarantine or repair.
    pub fn hydrate_from(
        &self,
        persistence: &dyn ChainPersistence,
    ) -> ServiceResult<ValidationReport> {
        let records = persistence.load_all()?;
        self.chain.set_all(records)?;
        {
            let mut index = self.index_write()?;
            index.rebuild(&self.chain.records()?);
        }
        let report = ChainValidator::validate_chain(&self.chain)?;
        if !report.is_valid() {
            warn!(
                violations = report.violations.len(),
                "hydrated chain failed validation"
            );
        }
        Ok(report)
    }

    /// Read-only access to the underlying chain store.
    pub fn store(&self) -> &ChainStore {
        &self.chain
    }

    pub fn record_count(&self) -> ServiceResult<usize> {
        Ok(self.chain.len()?)
    }

    fn snapshot_at(&self, record_id: &RecordId) -> ServiceResult<(usize, UnitSnapshot)> {
        let (position, record) = self
            .chain
            .find_by_id(record_id)?
            .ok_or_else(|| ServiceError::NotFound(record_id.to_string()))?;
        match record.as_snapshot() {
            Some(snapshot) => Ok((position, snapshot.clone())),
            None => Err(ServiceError::NotFound(record_id.to_string())),
        }
    }

    fn index_record(&self, record: &Record) -> ServiceResult<()> {
        // Positions are stable (records are never removed), so resolving
        // the just-appended record's position by id is race-free.
        if let Some((position, _)) = self.chain.find_by_id(&record.id)? {
            self.index_write()?.note_append(record.unit_key(), position);
        }
        Ok(())
    }

    fn index_read(&self) -> ServiceResult<std::sync::RwLockReadGuard<'_, UnitIndex>> {
        self.index
            .read()
            .map_err(|_| ServiceError::Ledger(LedgerError::LockPoisoned))
    }

    fn index_write(&self) -> ServiceResult<std::sync::RwLockWriteGuard<'_, UnitIndex>> {
        self.index
            .write()
            .map_err(|_| ServiceError::Ledger(LedgerError::LockPoisoned))
    }
}

fn ensure_transition(snapshot: &UnitSnapshot, next: UnitStatus) -> ServiceResult<()> {
    if snapshot.status == UnitStatus::Suspicious {
        return Err(ServiceError::UnitQuarantined(snapshot.unit.clone()));
    }
    if !snapshot.status.can_transition_to(next) {
        return Err(ServiceError::InvalidTransition {
            from: snapshot.status,
            to: next,
        });
    }
    Ok(())
}

fn actor(field: &str, value: &str) -> ServiceResult<ActorId> {
    ActorId::new(value).map_err(|_| ServiceError::Validation {
        field: field.to_string(),
        reason: "must not be empty".to_string(),
    })
}

fn unit_key(field: &str, value: &str) -> ServiceResult<UnitId> {
    UnitId::new(value).map_err(|_| ServiceError::Validation {
        field: field.to_string(),
        reason: "must not be empty".to_string(),
    })
}

fn non_empty(field: &str, value: &str) -> ServiceResult<String> {
    if value.is_empty() {
        return Err(ServiceError::Validation {
            field: field.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(value.to_string())
}
