use thiserror::Error;

use medi_types::{UnitId, UnitStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// An input attribute failed a required-field or ordering constraint.
    /// Raised before any mutation; the chain is left untouched.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// The referenced record id or unit key does not exist in the store.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The unit was flagged suspicious; the flag is absorbing and is not
    /// silently overwritten by later operations.
    #[error("unit {0} is flagged suspicious and quarantined")]
    UnitQuarantined(UnitId),

    /// The unit's lifecycle does not permit this status change.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: UnitStatus, to: UnitStatus },

    #[error("ledger error: {0}")]
    Ledger(#[from] medi_ledger::LedgerError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
