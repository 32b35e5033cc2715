//! Remote source abstraction.

use std::future::Future;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::document::{DocumentContent, DocumentId};
use crate::remote::types::{RemoteResult, SearchPage, SearchQuery};

/// A remote configuration service.
///
/// This trait abstracts the wire protocol, allowing for different
/// implementations (HTTP, in-memory for embedding and tests, etc.).
pub trait RemoteSource: Send + Sync + 'static {
    /// Fetch the current content of a document.
    fn fetch(
        &self,
        id: &DocumentId,
        group: &str,
    ) -> impl Future<Output = RemoteResult<DocumentContent>> + Send;

    /// Fetch one page of the documents in `group` selected by the query.
    fn search(
        &self,
        group: &str,
        query: &SearchQuery,
    ) -> impl Future<Output = RemoteResult<SearchPage>> + Send;

    /// Register `sink` to receive every new content of the document.
    ///
    /// Delivery is asynchronous and at-least-once. At most one sink may be
    /// registered per document.
    fn subscribe(
        &self,
        id: &DocumentId,
        group: &str,
        sink: ChangeSink,
    ) -> impl Future<Output = RemoteResult<()>> + Send;
}

/// Returned when the receiving side of a [`ChangeSink`] is gone.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("change sink closed")]
pub struct SinkClosed;

/// Sending half of a single document's change queue.
#[derive(Debug, Clone)]
pub struct ChangeSink {
    id: DocumentId,
    tx: mpsc::UnboundedSender<DocumentContent>,
}

impl ChangeSink {
    /// Create a sink for `id` together with its receiving queue.
    pub fn channel(id: DocumentId) -> (Self, mpsc::UnboundedReceiver<DocumentContent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, tx }, rx)
    }

    /// The document this sink belongs to.
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Deliver new content for the document.
    pub fn notify(&self, content: DocumentContent) -> Result<(), SinkClosed> {
        self.tx.send(content).map_err(|_| SinkClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once the receiving side has been dropped.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}
