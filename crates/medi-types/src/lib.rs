//! Foundation types for the Medi provenance ledger.
//!
//! This crate provides the identity, hash, and temporal types used
//! throughout the ledger core. Every other `medi` crate depends on
//! `medi-types`.
//!
//! # Key Types
//!
//! - [`RecordId`] — UUID v7 identifier assigned to each chain record
//! - [`UnitId`] — business key for one tracked medicine unit
//! - [`ActorId`] — holder/actor identity (manufacturer, transporter, shop)
//! - [`RecordHash`] — 32-byte BLAKE3 chain digest with hex round-trip
//! - [`Timestamp`] — totally-ordered chain timestamp (millis + tick)
//! - [`UnitStatus`] — supply-chain status machine

pub mod error;
pub mod hash;
pub mod id;
pub mod status;
pub mod temporal;

pub use error::TypeError;
pub use hash::RecordHash;
pub use id::{ActorId, RecordId, UnitId};
pub use status::UnitStatus;
pub use temporal::Timestamp;
