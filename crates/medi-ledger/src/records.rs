use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use medi_crypto::{ChainHasher, ChainRecord};
use medi_types::hash::prev_hash_repr;
use medi_types::{ActorId, RecordHash, RecordId, Timestamp, UnitId, UnitStatus};

use crate::error::LedgerError;

/// One unit in the hash chain.
///
/// A record's hash covers `(id, timestamp, prev_hash, payload)` in that
/// order; the payload is canonical JSON (struct fields in declaration
/// order, metadata maps key-sorted), so the hash is reproducible across
/// processes. For every record at position `i > 0` of a chain,
/// `prev_hash` equals the predecessor's `hash`; the first record carries
/// `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub timestamp: Timestamp,
    pub prev_hash: Option<RecordHash>,
    pub hash: RecordHash,
    pub payload: RecordPayload,
}

impl Record {
    /// Create a sealed record: fresh id, the given timestamp and
    /// predecessor link, hash computed over the canonical fields.
    pub fn create(
        payload: RecordPayload,
        prev_hash: Option<RecordHash>,
        timestamp: Timestamp,
    ) -> Result<Self, LedgerError> {
        let id = RecordId::new();
        let hash = seal_hash(&id, &timestamp, prev_hash.as_ref(), &payload)?;
        Ok(Self {
            id,
            timestamp,
            prev_hash,
            hash,
            payload,
        })
    }

    /// The business key of the unit this record concerns.
    pub fn unit_key(&self) -> &UnitId {
        self.payload.unit_key()
    }

    pub fn as_snapshot(&self) -> Option<&UnitSnapshot> {
        match &self.payload {
            RecordPayload::Snapshot(snapshot) => Some(snapshot),
            RecordPayload::Event(_) => None,
        }
    }

    pub fn as_event(&self) -> Option<&EventRecord> {
        match &self.payload {
            RecordPayload::Event(event) => Some(event),
            RecordPayload::Snapshot(_) => None,
        }
    }
}

impl ChainRecord for Record {
    fn record_hash(&self) -> RecordHash {
        self.hash
    }

    fn prev_hash(&self) -> Option<RecordHash> {
        self.prev_hash
    }

    fn computed_hash(&self) -> RecordHash {
        // Plain data serialization cannot fail; if it ever did, the empty
        // fallback surfaces as a hash mismatch instead of a panic.
        let payload_json = serde_json::to_vec(&self.payload).unwrap_or_default();
        digest_record_fields(
            &self.id,
            &self.timestamp,
            self.prev_hash.as_ref(),
            &payload_json,
        )
    }
}

/// Compute the chain hash for a record's canonical fields.
pub(crate) fn seal_hash(
    id: &RecordId,
    timestamp: &Timestamp,
    prev_hash: Option<&RecordHash>,
    payload: &RecordPayload,
) -> Result<RecordHash, LedgerError> {
    let payload_json =
        serde_json::to_vec(payload).map_err(|e| LedgerError::Serialization(e.to_string()))?;
    Ok(digest_record_fields(id, timestamp, prev_hash, &payload_json))
}

fn digest_record_fields(
    id: &RecordId,
    timestamp: &Timestamp,
    prev_hash: Option<&RecordHash>,
    payload_json: &[u8],
) -> RecordHash {
    let id_repr = id.to_string();
    let ts_repr = timestamp.to_string();
    let prev_repr = prev_hash_repr(prev_hash);
    ChainHasher::RECORD.digest_parts(&[
        id_repr.as_bytes(),
        ts_repr.as_bytes(),
        prev_repr.as_bytes(),
        payload_json,
    ])
}

/// Domain payload of one record.
///
/// The two shapes the source application evolved — a full mutable state
/// snapshot and an immutable event delta — share one chain contract, so
/// the store and validator are written once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RecordPayload {
    /// Full current state of one unit, replaced wholesale at each step.
    Snapshot(UnitSnapshot),
    /// One supply-chain event, appended and never mutated.
    Event(EventRecord),
}

impl RecordPayload {
    pub fn unit_key(&self) -> &UnitId {
        match self {
            Self::Snapshot(snapshot) => &snapshot.unit,
            Self::Event(event) => &event.unit,
        }
    }
}

/// Full state of one tracked medicine unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub unit: UnitId,
    pub batch_number: String,
    pub manufacturer_name: String,
    pub drug_name: String,
    pub composition: String,
    pub manufacture_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub manufacturing_location: String,
    pub current_location: String,
    pub current_holder: ActorId,
    pub handover_history: Vec<Handover>,
    /// Late-bound artifact attached after creation (e.g. a generated QR
    /// link); empty until set.
    pub reference_url: String,
    pub status: UnitStatus,
}

impl UnitSnapshot {
    /// Placeholder snapshot carried by a chain's seed record.
    pub fn genesis() -> Self {
        let now = Utc::now();
        Self {
            unit: UnitId::genesis(),
            batch_number: "genesis".to_string(),
            manufacturer_name: "Genesis".to_string(),
            drug_name: "Genesis".to_string(),
            composition: "Genesis".to_string(),
            manufacture_date: now,
            expiry_date: now + Duration::days(365),
            manufacturing_location: "Genesis".to_string(),
            current_location: "Genesis".to_string(),
            current_holder: ActorId::new("Genesis").unwrap_or_else(|_| unreachable!()),
            handover_history: Vec::new(),
            reference_url: String::new(),
            status: UnitStatus::Registered,
        }
    }
}

/// One custody transfer inside a snapshot's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Handover {
    pub from_entity: ActorId,
    pub to_entity: ActorId,
    pub timestamp: Timestamp,
    pub location: String,
    pub notes: String,
}

/// One supply-chain event for a unit's per-entity trail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub unit: UnitId,
    pub kind: EventKind,
    pub from_actor: ActorId,
    pub to_actor: Option<ActorId>,
    pub location: Option<String>,
    /// Free-form annotations; key-sorted so the canonical encoding (and
    /// therefore the record hash) is stable.
    pub metadata: BTreeMap<String, String>,
}

impl EventRecord {
    pub fn new(unit: UnitId, kind: EventKind, from_actor: ActorId) -> Self {
        Self {
            unit,
            kind,
            from_actor,
            to_actor: None,
            location: None,
            metadata: BTreeMap::new(),
        }
    }
}

/// Kind of supply-chain event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Registration,
    Dispatch,
    Receive,
    Verification,
    Rejection,
    Sale,
    /// Suspicious-activity report.
    Flag,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registration => write!(f, "registration"),
            Self::Dispatch => write!(f, "dispatch"),
            Self::Receive => write!(f, "receive"),
            Self::Verification => write!(f, "verification"),
            Self::Rejection => write!(f, "rejection"),
            Self::Sale => write!(f, "sale"),
            Self::Flag => write!(f, "flag"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> UnitSnapshot {
        let now = Utc::now();
        UnitSnapshot {
            unit: UnitId::new("DRG-001").unwrap(),
            batch_number: "B-17".into(),
            manufacturer_name: "Acme Pharma".into(),
            drug_name: "Paracetamol".into(),
            composition: "500mg".into(),
            manufacture_date: now,
            expiry_date: now + Duration::days(730),
            manufacturing_location: "Plant-A".into(),
            current_location: "Plant-A".into(),
            current_holder: ActorId::new("M1").unwrap(),
            handover_history: vec![],
            reference_url: String::new(),
            status: UnitStatus::Registered,
        }
    }

    #[test]
    fn create_seals_a_self_consistent_record() {
        let record =
            Record::create(RecordPayload::Snapshot(sample_snapshot()), None, Timestamp::now())
                .unwrap();
        assert_eq!(record.computed_hash(), record.hash);
        assert_eq!(record.prev_hash, None);
    }

    #[test]
    fn hash_covers_the_predecessor_link() {
        let payload = RecordPayload::Snapshot(sample_snapshot());
        let ts = Timestamp::new(1000, 0);
        let a = Record::create(payload.clone(), None, ts).unwrap();
        let b = Record::create(
            payload,
            Some(RecordHash::from_digest([7; 32])),
            ts,
        )
        .unwrap();
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn hash_changes_with_payload() {
        let ts = Timestamp::new(1000, 0);
        let mut snapshot = sample_snapshot();
        let a = Record::create(RecordPayload::Snapshot(snapshot.clone()), None, ts).unwrap();
        snapshot.current_location = "Warehouse-B".into();
        let b = Record::create(RecordPayload::Snapshot(snapshot), None, ts).unwrap();
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn tampering_breaks_self_consistency() {
        let mut record =
            Record::create(RecordPayload::Snapshot(sample_snapshot()), None, Timestamp::now())
                .unwrap();
        if let RecordPayload::Snapshot(snapshot) = &mut record.payload {
            snapshot.current_holder = ActorId::new("intruder").unwrap();
        }
        assert_ne!(record.computed_hash(), record.hash);
    }

    #[test]
    fn unit_key_for_both_shapes() {
        let unit = UnitId::new("DRG-002").unwrap();
        let event = EventRecord::new(
            unit.clone(),
            EventKind::Registration,
            ActorId::new("M1").unwrap(),
        );
        let record =
            Record::create(RecordPayload::Event(event), None, Timestamp::now()).unwrap();
        assert_eq!(record.unit_key(), &unit);

        let snapshot_record =
            Record::create(RecordPayload::Snapshot(sample_snapshot()), None, Timestamp::now())
                .unwrap();
        assert_eq!(snapshot_record.unit_key().as_str(), "DRG-001");
    }

    #[test]
    fn genesis_snapshot_is_recognizable() {
        let genesis = UnitSnapshot::genesis();
        assert!(genesis.unit.is_genesis());
        assert_eq!(genesis.status, UnitStatus::Registered);
        assert!(genesis.handover_history.is_empty());
    }

    #[test]
    fn serde_roundtrip_reproduces_the_hash() {
        let record =
            Record::create(RecordPayload::Snapshot(sample_snapshot()), None, Timestamp::now())
                .unwrap();
        let json = serde_json::to_string(&record).unwrap();
        let parsed: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(parsed.computed_hash(), record.hash);
    }

    #[test]
    fn metadata_is_key_sorted_in_canonical_form() {
        let mut event = EventRecord::new(
            UnitId::new("DRG-003").unwrap(),
            EventKind::Flag,
            ActorId::new("C1").unwrap(),
        );
        event.metadata.insert("zeta".into(), "1".into());
        event.metadata.insert("alpha".into(), "2".into());
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.find("alpha").unwrap() < json.find("zeta").unwrap());
    }
}
