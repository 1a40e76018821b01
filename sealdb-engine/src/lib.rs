//! Encrypted SQLite storage engine for SealDB.
//!
//! [`Engine`] implements [`DocumentStore`](sealdb_store::DocumentStore) on a
//! single SQLite file (or an in-memory database):
//!
//! - `documents`: one row per path; payload and fields sealed with the secret
//!   key, path and timestamps in the clear
//! - `counters`: change-feed indices per collection
//! - `meta`: layout version and a sealed verification token that rejects the
//!   wrong key at open time

mod codec;
mod config;
mod engine;
mod iterator;
mod registry;
mod schema;

pub use config::EngineConfig;
pub use engine::Engine;
