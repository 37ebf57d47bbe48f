//! Append-only record chain for the Medi provenance ledger.
//!
//! This crate is the heart of the ledger core. It provides:
//! - The [`Record`] type with hash-linked integrity and its two payload
//!   shapes ([`UnitSnapshot`] and [`EventRecord`])
//! - The [`ChainStore`] in-memory record store with serialized mutations
//! - [`ChainReader`] / [`ChainWriter`] trait boundaries
//! - [`ChainValidator`] — report-style tamper detection over whole chains
//!   or per-unit sub-chains
//! - The [`ChainPersistence`] contract for external storage collaborators

pub mod error;
pub mod persist;
pub mod records;
pub mod store;
pub mod traits;
pub mod validation;

pub use error::LedgerError;
pub use persist::{ChainPersistence, MemoryPersistence};
pub use records::{EventKind, EventRecord, Handover, Record, RecordPayload, UnitSnapshot};
pub use store::ChainStore;
pub use traits::{ChainReader, ChainWriter};
pub use validation::{ChainValidator, ValidationReport, Violation, ViolationKind};
