//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Configuration for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rows fetched per iterator page. The store lock is held for one page.
    pub page_size: usize,
    /// How long SQLite waits on a locked database file, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            busy_timeout_ms: 5_000,
        }
    }
}
