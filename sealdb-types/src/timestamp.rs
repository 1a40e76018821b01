//! Hybrid logical timestamps for document metadata and change cursors.
//!
//! Combines physical time with a logical counter so that a single clock can
//! hand out strictly increasing stamps even when several writes land in the
//! same millisecond.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A hybrid logical timestamp.
///
/// Consists of:
/// - `wall_time`: Milliseconds since Unix epoch (physical component)
/// - `logical`: Logical counter for stamps issued within the same millisecond
///
/// The zero timestamp is used as the "from the beginning" change cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HybridTimestamp {
    /// Physical time component (milliseconds since Unix epoch).
    wall_time: u64,
    /// Logical counter for ordering stamps at the same wall time.
    logical: u32,
}

fn wall_clock_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

impl HybridTimestamp {
    /// The zero timestamp, ordered before every issued stamp.
    pub const ZERO: Self = Self::new(0, 0);

    /// Creates a new timestamp at the current time.
    #[must_use]
    pub fn now() -> Self {
        Self {
            wall_time: wall_clock_millis(),
            logical: 0,
        }
    }

    /// Creates a timestamp from components.
    #[must_use]
    pub const fn new(wall_time: u64, logical: u32) -> Self {
        Self { wall_time, logical }
    }

    /// Creates a timestamp from milliseconds with a zero logical counter.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self::new(millis, 0)
    }

    /// Returns the wall time component.
    #[must_use]
    pub const fn wall_time(&self) -> u64 {
        self.wall_time
    }

    /// Returns the logical counter.
    #[must_use]
    pub const fn logical(&self) -> u32 {
        self.logical
    }

    /// Returns true for the zero timestamp.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.wall_time == 0 && self.logical == 0
    }

    /// Generates the next timestamp, ensuring monotonicity.
    ///
    /// The result is strictly greater than `self`.
    #[must_use]
    pub fn tick(&self) -> Self {
        self.tick_at(wall_clock_millis())
    }

    /// Same as [`tick`](Self::tick) with an explicit physical time.
    #[must_use]
    pub fn tick_at(&self, now: u64) -> Self {
        if now > self.wall_time {
            Self {
                wall_time: now,
                logical: 0,
            }
        } else {
            Self {
                wall_time: self.wall_time,
                logical: self.logical.saturating_add(1),
            }
        }
    }

    /// Returns true if this timestamp is before the other.
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self < other
    }

    /// Returns true if this timestamp is after the other.
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }
}

impl PartialOrd for HybridTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HybridTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.wall_time.cmp(&other.wall_time) {
            Ordering::Equal => self.logical.cmp(&other.logical),
            other => other,
        }
    }
}

impl fmt::Display for HybridTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.wall_time, self.logical)
    }
}
