use std::fmt;

use serde::{Deserialize, Serialize};

/// Supply-chain status of one tracked unit.
///
/// The normal lifecycle is `Registered → InTransit → {Delivered, Verified}
/// → Sold`. `Suspicious` is reachable from any non-terminal state and is
/// absorbing: no transition leads out of it. `Sold` is likewise terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    Registered,
    InTransit,
    Delivered,
    Verified,
    Sold,
    Suspicious,
}

impl UnitStatus {
    /// Returns `true` if no transition is defined out of this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Sold | Self::Suspicious)
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: UnitStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == Self::Suspicious {
            return true;
        }
        matches!(
            (self, next),
            (Self::Registered, Self::InTransit)
                | (Self::InTransit, Self::InTransit)
                | (Self::InTransit, Self::Delivered)
                | (Self::InTransit, Self::Verified)
                | (Self::Delivered, Self::InTransit)
                | (Self::Delivered, Self::Verified)
                | (Self::Delivered, Self::Sold)
                | (Self::Verified, Self::Sold)
        )
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered => write!(f, "Registered"),
            Self::InTransit => write!(f, "In Transit"),
            Self::Delivered => write!(f, "Delivered"),
            Self::Verified => write!(f, "Verified"),
            Self::Sold => write!(f, "Sold"),
            Self::Suspicious => write!(f, "Suspicious"),
        }
    }
}
