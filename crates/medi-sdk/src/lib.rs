//! High-level API for the Medi provenance ledger.
//!
//! Two managers compose the chain store, lookup index, and validator:
//!
//! - [`ProvenanceLedger`] — snapshot-style operations over one global
//!   chain: register a unit, record handovers, deliveries, verifications
//!   and sales, flag suspicious activity, attach late-bound references,
//!   and validate or persist the chain.
//! - [`EventLedger`] — event-style per-unit trails: append immutable
//!   supply-chain events and validate each unit's sub-chain.
//!
//! Both are explicit owned handles; there is no ambient global instance.

pub mod error;
pub mod events;
pub mod registration;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use events::EventLedger;
pub use registration::UnitRegistration;
pub use service::ProvenanceLedger;
