//! Provisions: the ways a vault can be unlocked.

use crate::config::KdfConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a provision unlocks the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// Argon2id key derived from a password.
    Password,
    /// A raw 32-byte key.
    Key,
}

/// Public metadata for one unlock method, synced as `/provision/<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provision {
    pub id: String,
    pub auth_type: AuthType,
    pub created_at: DateTime<Utc>,
}

impl Provision {
    pub(crate) fn new(auth_type: AuthType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            auth_type,
            created_at: Utc::now(),
        }
    }
}

/// The master key wrapped for one provision, synced as `/auth/<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct AuthEntry {
    pub id: String,
    pub auth_type: AuthType,
    pub wrapped_key: Vec<u8>,
    /// KDF cost the password key was derived with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf: Option<KdfConfig>,
}
