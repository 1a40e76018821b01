//! Cloud adapter configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a [`CloudStore`](crate::CloudStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Documents requested per service query.
    pub page_size: usize,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self { page_size: 100 }
    }
}
