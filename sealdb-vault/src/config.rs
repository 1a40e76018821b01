//! Vault configuration.

use sealdb_crypto::KdfParams;
use serde::{Deserialize, Serialize};

/// Argon2id cost for new password provisions.
///
/// Stored with each provision, so changing it never locks out existing ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfConfig {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Iterations.
    pub time_cost: u32,
    pub parallelism: u32,
}

impl KdfConfig {
    /// Cheap settings for tests. Not for real passwords.
    pub fn insecure_fast() -> Self {
        KdfParams::insecure_fast().into()
    }
}

impl Default for KdfConfig {
    fn default() -> Self {
        KdfParams::default().into()
    }
}

impl From<KdfParams> for KdfConfig {
    fn from(p: KdfParams) -> Self {
        Self {
            memory_cost: p.memory_cost,
            time_cost: p.time_cost,
            parallelism: p.parallelism,
        }
    }
}

impl From<&KdfConfig> for KdfParams {
    fn from(c: &KdfConfig) -> Self {
        Self {
            memory_cost: c.memory_cost,
            time_cost: c.time_cost,
            parallelism: c.parallelism,
        }
    }
}

/// Configuration for a [`Vault`](crate::Vault).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Records requested per remote pull.
    pub pull_limit: usize,
    /// Key derivation for new password provisions.
    pub kdf: KdfConfig,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            pull_limit: 100,
            kdf: KdfConfig::default(),
        }
    }
}
