//! Document stores.
//!
//! - memory.rs: `ConfigStore`, the in-memory map the hosting application reads
//! - disk.rs: `CacheStore`, a file per document under the cache directory
//!
//! Both are written on every fetch and change notification, cache first.
//! They converge eventually; a crash between the two writes can leave them
//! apart until the next update.

pub mod disk;
pub mod memory;

pub use disk::{CacheError, CacheStore};
pub use memory::{lookup_key, ConfigStore, LookupError};
