use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Chain timestamp with a stable total order.
///
/// Combines wall-clock milliseconds with a logical tick so that two records
/// appended within the same millisecond still order deterministically. The
/// store advances the tick on append; callers never construct colliding
/// timestamps themselves.
///
/// Ordering: `millis` → `tick`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Wall-clock milliseconds since UNIX epoch.
    pub millis: u64,
    /// Logical counter for records sharing the same millisecond.
    pub tick: u32,
}

impl Timestamp {
    /// Create a timestamp with explicit values.
    pub fn new(millis: u64, tick: u32) -> Self {
        Self { millis, tick }
    }

    /// Create a timestamp for the current wall-clock time.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self { millis, tick: 0 }
    }

    /// The zero timestamp (genesis placeholder).
    pub const fn zero() -> Self {
        Self { millis: 0, tick: 0 }
    }

    /// Next timestamp strictly after `self`, anchored to the current
    /// wall clock when it has moved on.
    pub fn successor(&self) -> Self {
        let now = Self::now();
        if now.millis > self.millis {
            now
        } else {
            Self {
                millis: self.millis,
                tick: self.tick.saturating_add(1),
            }
        }
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.millis
            .cmp(&other.millis)
            .then(self.tick.cmp(&other.tick))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ms.{})", self.millis, self.tick)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.millis, self.tick)
    }
}
