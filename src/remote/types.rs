//! Remote source request/response types and error definitions.

use std::num::NonZeroU32;

use thiserror::Error;

use crate::config::SearchMode;
use crate::document::DocumentId;

/// Errors that can occur when talking to the remote configuration service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Network or service failure.
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The requested document does not exist.
    #[error("document '{id}' not found in group '{group}'")]
    NotFound { id: DocumentId, group: String },

    /// The change subscription was rejected.
    #[error("subscription for '{id}' failed: {reason}")]
    SubscriptionFailed { id: DocumentId, reason: String },
}

impl RemoteError {
    pub fn not_found(id: &DocumentId, group: &str) -> Self {
        Self::NotFound {
            id: id.clone(),
            group: group.to_string(),
        }
    }

    pub fn subscription_failed(id: &DocumentId, reason: impl Into<String>) -> Self {
        Self::SubscriptionFailed {
            id: id.clone(),
            reason: reason.into(),
        }
    }
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// One page request of a document search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Id filter; empty selects the whole group.
    pub filter: String,
    pub mode: SearchMode,
    pub page_size: NonZeroU32,
    /// 1-indexed page number.
    pub page_no: u32,
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Ids on this page.
    pub items: Vec<DocumentId>,
    /// Total number of matches across all pages, as reported for this page.
    pub total_count: u64,
}
