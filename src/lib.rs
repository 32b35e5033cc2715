//! Client-side configuration sync for Nacos-style config services.
//!
//! Discovers every document of one group, loads each into an in-memory
//! store mirrored to an on-disk cache, and keeps both current by applying
//! change notifications per document in arrival order.

pub mod config;
pub mod document;
pub mod lifecycle;
pub mod observability;
pub mod remote;
pub mod resilience;
pub mod store;
pub mod sync;

pub use config::schema::BootstrapConfig;
pub use document::{DocumentContent, DocumentId};
pub use lifecycle::Shutdown;
pub use remote::{MemorySource, NacosHttpSource, RemoteSource};
pub use store::{CacheStore, ConfigStore};
pub use sync::{SyncEngine, SyncError, SyncState};
