//! Remote configuration source subsystem.
//!
//! # Data Flow
//! ```text
//! BootstrapConfig (server, namespace, timeout)
//!     → http.rs (Nacos v1 open API over reqwest)
//!     → source.rs (RemoteSource: fetch / search / subscribe)
//!     → ChangeSink (per-document change queue) → sync engine workers
//! ```
//!
//! # Constraints
//! - Every remote call carries the configured timeout
//! - Subscription failures are reported, never fatal to the caller
//! - One sink per document; delivery is at-least-once

pub mod http;
pub mod memory;
pub mod source;
pub mod types;

pub use http::NacosHttpSource;
pub use memory::MemorySource;
pub use source::{ChangeSink, RemoteSource, SinkClosed};
pub use types::{RemoteError, RemoteResult, SearchPage, SearchQuery};
