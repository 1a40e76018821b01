//! Clocks that stamp document writes and change records.

use crate::HybridTimestamp;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of timestamps for a store.
///
/// Implementations must return strictly increasing values: every store stamps
/// writes from its clock under its own lock, and the change feed relies on
/// stamps never repeating.
pub trait Clock: Send + Sync {
    /// Returns the next timestamp.
    fn now(&self) -> HybridTimestamp;
}

/// Wall clock with a logical counter for stamps in the same millisecond.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: Mutex<HybridTimestamp>,
}

impl SystemClock {
    /// Creates a new system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock whose stamps all come after `last`.
    pub fn after(last: HybridTimestamp) -> Self {
        Self {
            last: Mutex::new(last),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> HybridTimestamp {
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = last.tick();
        *last = next;
        next
    }
}

/// Deterministic clock for tests.
///
/// Starts at `1234567890000` ms and advances one millisecond per call, so the
/// first stamp is `1234567890001`.
#[derive(Debug)]
pub struct TestClock {
    millis: AtomicU64,
}

impl TestClock {
    /// Default starting point in milliseconds.
    pub const START: u64 = 1_234_567_890_000;

    /// Creates a test clock at [`TestClock::START`].
    pub fn new() -> Self {
        Self::starting_at(Self::START)
    }

    /// Creates a test clock whose first stamp is `millis + 1`.
    pub fn starting_at(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    /// Advances the clock without issuing a stamp.
    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now(&self) -> HybridTimestamp {
        let millis = self.millis.fetch_add(1, Ordering::SeqCst) + 1;
        HybridTimestamp::from_millis(millis)
    }
}
