//! Hashing primitives for the Medi provenance ledger.
//!
//! Two pieces live here:
//!
//! - [`ChainHasher`] — the domain-separated BLAKE3 digest every record hash
//!   is computed with
//! - [`ChainRecord`] + [`verify_links`] — the one shared hash-chain walk
//!   used by every validator in the workspace

pub mod chain;
pub mod hasher;

pub use chain::{verify_links, ChainRecord, LinkFault, LinkFaultKind};
pub use hasher::{ChainHasher, HasherError};
