//! Lookup index for the Medi provenance ledger.
//!
//! Maps a unit's business key to the chain positions of its records, so
//! hot-path point queries (current holder's inventory, one unit's
//! history) avoid a full chain scan. The index is a performance layer,
//! not a correctness layer: the store's `find`/`sub_chain` is always the
//! fallback, and the index can be rebuilt from the chain at any time.

pub mod index;

pub use index::UnitIndex;
