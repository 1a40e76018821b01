//! Cloud document service adapter for SealDB.
//!
//! [`CloudStore`] implements [`DocumentStore`](sealdb_store::DocumentStore) on
//! any [`DocumentService`]: a hosted document database reached through its
//! native get/set/query contract. [`MemoryService`] is an in-process service
//! for tests and local development.

mod config;
mod error;
mod memory;
mod service;
mod store;

pub use config::CloudConfig;
pub use error::{CloudError, CloudResult};
pub use memory::MemoryService;
pub use service::{DocumentService, Query, ServiceDocument};
pub use store::{CloudStore, DATA_FIELD};
