//! Configuration sync subsystem.
//!
//! # Data Flow
//! ```text
//! BootstrapConfig
//!     → discovery.rs (paged search → id set)
//!     → engine.rs (per id: fetch → cache → store → subscribe)
//!     → worker.rs (per id queue: change → cache → store)
//! ```
//!
//! # Design Decisions
//! - Startup is synchronous from the caller's view: `SyncEngine::start`
//!   returns once every discovered document is loaded
//! - One queue and one worker per document keeps per-id ordering
//! - Steady-state failures are logged and counted, never returned

pub mod discovery;
pub mod engine;
pub mod state;
mod worker;

use thiserror::Error;

use crate::config::ConfigError;
use crate::document::DocumentId;
use crate::remote::RemoteError;

pub use discovery::{discover_ids, Discovered};
pub use engine::SyncEngine;
pub use state::{SyncState, SyncStatsSnapshot};

/// Errors that abort engine startup.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("bootstrap configuration rejected: {0}")]
    BootstrapParseFailed(#[from] ConfigError),

    #[error("remote source could not be created: {0}")]
    SourceInit(#[source] RemoteError),

    #[error("discovery in group '{group}' failed: {source}")]
    Discovery {
        group: String,
        #[source]
        source: RemoteError,
    },

    #[error("initial fetch of '{id}' in group '{group}' failed: {source}")]
    InitialFetch {
        id: DocumentId,
        group: String,
        #[source]
        source: RemoteError,
    },
}

impl SyncError {
    /// The remote failure behind this error, if any.
    pub fn remote_error(&self) -> Option<&RemoteError> {
        match self {
            SyncError::BootstrapParseFailed(_) => None,
            SyncError::SourceInit(e) => Some(e),
            SyncError::Discovery { source, .. } | SyncError::InitialFetch { source, .. } => Some(source),
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
