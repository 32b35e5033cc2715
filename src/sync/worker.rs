//! Per-document change worker.
//!
//! Each subscribed document owns one queue and one worker. Notifications for
//! a document are applied strictly in arrival order, so an older value can
//! never overwrite a newer one in the cache. Workers for different documents
//! run independently.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::document::{DocumentContent, DocumentId};
use crate::observability::metrics;
use crate::store::{CacheStore, ConfigStore};
use crate::sync::state::SyncStats;

/// Writes change notifications for one document to the cache and the store.
pub(crate) struct ChangeWorker {
    pub(crate) id: DocumentId,
    pub(crate) cache: CacheStore,
    pub(crate) store: ConfigStore,
    pub(crate) stats: Arc<SyncStats>,
}

impl ChangeWorker {
    /// Consume the queue until it closes or shutdown is signalled.
    pub(crate) async fn run(
        self,
        mut changes: mpsc::UnboundedReceiver<DocumentContent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                change = changes.recv() => match change {
                    Some(content) => self.apply(content).await,
                    None => break,
                },
            }
        }
        tracing::debug!(id = %self.id, "Change worker stopped");
    }

    async fn apply(&self, content: DocumentContent) {
        tracing::info!(id = %self.id, bytes = content.len(), "Change detected, reloading document");

        // A stale cache is tolerated; the store still gets the new value.
        let outcome = match self.cache.write(&self.id, &content).await {
            Ok(()) => "applied",
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "Cache write failed for change notification");
                self.stats.record_cache_write_failure();
                metrics::record_cache_write_failure();
                "cache_stale"
            }
        };

        self.store.set(self.id.clone(), content);
        self.stats.record_notification_applied();
        metrics::record_notification(outcome);
        tracing::debug!(id = %self.id, outcome, "Document reloaded");
    }
}
