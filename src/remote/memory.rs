//! In-process remote source.
//!
//! Holds documents in memory and delivers changes to subscribers directly.
//! Useful for embedding the engine without a server and for tests, which can
//! inject failures and count calls.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};

use crate::document::{DocumentContent, DocumentId};
use crate::remote::source::{ChangeSink, RemoteSource};
use crate::remote::types::{RemoteError, RemoteResult, SearchPage, SearchQuery};

type Key = (String, DocumentId);

#[derive(Default)]
struct Inner {
    documents: DashMap<Key, DocumentContent>,
    subscribers: DashMap<Key, ChangeSink>,
    failing_fetches: DashSet<DocumentId>,
    rejected_subscriptions: DashSet<DocumentId>,
    search_unavailable: AtomicBool,
    search_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

/// A remote source backed by process memory.
#[derive(Clone, Default)]
pub struct MemorySource {
    inner: Arc<Inner>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document without notifying subscribers.
    pub fn insert(&self, group: &str, id: impl Into<DocumentId>, content: impl Into<DocumentContent>) {
        self.inner
            .documents
            .insert((group.to_string(), id.into()), content.into());
    }

    /// Store a document and notify its subscriber, if any.
    ///
    /// Returns true when a live subscriber received the content.
    pub fn publish(&self, group: &str, id: impl Into<DocumentId>, content: impl Into<DocumentContent>) -> bool {
        let key = (group.to_string(), id.into());
        let content = content.into();
        self.inner.documents.insert(key.clone(), content.clone());

        match self.inner.subscribers.get(&key) {
            Some(sink) => sink.notify(content).is_ok(),
            None => false,
        }
    }

    /// Make every subsequent search fail with `Unavailable`.
    pub fn set_search_unavailable(&self, unavailable: bool) {
        self.inner.search_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make every subsequent fetch of `id` fail with `Unavailable`.
    pub fn fail_fetch(&self, id: impl Into<DocumentId>) {
        self.inner.failing_fetches.insert(id.into());
    }

    /// Reject subscriptions for `id`.
    pub fn reject_subscription(&self, id: impl Into<DocumentId>) {
        self.inner.rejected_subscriptions.insert(id.into());
    }

    pub fn search_calls(&self) -> usize {
        self.inner.search_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.inner.fetch_calls.load(Ordering::SeqCst)
    }

    /// Number of subscribers whose queue is still open.
    pub fn live_subscribers(&self) -> usize {
        self.inner
            .subscribers
            .iter()
            .filter(|entry| !entry.value().is_closed())
            .count()
    }

    /// Whether `id` has a subscriber whose queue is still open.
    pub fn is_subscribed(&self, group: &str, id: &str) -> bool {
        self.inner
            .subscribers
            .get(&(group.to_string(), DocumentId::from(id)))
            .map(|sink| !sink.is_closed())
            .unwrap_or(false)
    }
}

impl RemoteSource for MemorySource {
    async fn fetch(&self, id: &DocumentId, group: &str) -> RemoteResult<DocumentContent> {
        self.inner.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if self.inner.failing_fetches.contains(id) {
            return Err(RemoteError::Unavailable(format!("injected fetch failure for '{}'", id)));
        }

        self.inner
            .documents
            .get(&(group.to_string(), id.clone()))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RemoteError::not_found(id, group))
    }

    async fn search(&self, group: &str, query: &SearchQuery) -> RemoteResult<SearchPage> {
        self.inner.search_calls.fetch_add(1, Ordering::SeqCst);

        if self.inner.search_unavailable.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("injected search failure".to_string()));
        }

        let mut matches: Vec<DocumentId> = self
            .inner
            .documents
            .iter()
            .filter(|entry| entry.key().0 == group)
            .map(|entry| entry.key().1.clone())
            .filter(|id| query.mode.matches(&query.filter, id.as_str()))
            .collect();
        matches.sort();

        let page_size = query.page_size.get() as usize;
        let skip = (query.page_no.max(1) as usize - 1).saturating_mul(page_size);

        Ok(SearchPage {
            total_count: matches.len() as u64,
            items: matches.into_iter().skip(skip).take(page_size).collect(),
        })
    }

    async fn subscribe(&self, id: &DocumentId, group: &str, sink: ChangeSink) -> RemoteResult<()> {
        if self.inner.rejected_subscriptions.contains(id) {
            return Err(RemoteError::subscription_failed(id, "rejected by remote"));
        }

        // Check and insert under one shard lock.
        match self.inner.subscribers.entry((group.to_string(), id.clone())) {
            Entry::Occupied(existing) if !existing.get().is_closed() => {
                Err(RemoteError::subscription_failed(id, "already subscribed"))
            }
            Entry::Occupied(mut stale) => {
                stale.insert(sink);
                Ok(())
            }
            Entry::Vacant(slot) => {
                slot.insert(sink);
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySource")
            .field("documents", &self.inner.documents.len())
            .field("subscribers", &self.inner.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchMode;
    use std::num::NonZeroU32;

    fn query(filter: &str, mode: SearchMode, page_size: u32, page_no: u32) -> SearchQuery {
        SearchQuery {
            filter: filter.to_string(),
            mode,
            page_size: NonZeroU32::new(page_size).unwrap(),
            page_no,
        }
    }

    #[tokio::test]
    async fn test_search_pages_are_sorted_and_bounded() {
        let source = MemorySource::new();
        for id in ["c", "a", "b"] {
            source.insert("app", id, "x = 1");
        }
        source.insert("other", "z", "x = 1");

        let page1 = source.search("app", &query("", SearchMode::Accurate, 2, 1)).await.unwrap();
        assert_eq!(page1.total_count, 3);
        assert_eq!(page1.items, vec![DocumentId::from("a"), DocumentId::from("b")]);

        let page2 = source.search("app", &query("", SearchMode::Accurate, 2, 2)).await.unwrap();
        assert_eq!(page2.items, vec![DocumentId::from("c")]);

        let page3 = source.search("app", &query("", SearchMode::Accurate, 2, 3)).await.unwrap();
        assert!(page3.items.is_empty());
        assert_eq!(source.search_calls(), 3);
    }

    #[tokio::test]
    async fn test_search_filters() {
        let source = MemorySource::new();
        for id in ["svc-a.toml", "svc-b.toml", "db.toml"] {
            source.insert("app", id, "");
        }

        let exact = source.search("app", &query("db.toml", SearchMode::Accurate, 10, 1)).await.unwrap();
        assert_eq!(exact.total_count, 1);

        let fuzzy = source.search("app", &query("svc-*", SearchMode::Blur, 10, 1)).await.unwrap();
        assert_eq!(fuzzy.total_count, 2);
    }

    #[tokio::test]
    async fn test_fetch_and_injected_failure() {
        let source = MemorySource::new();
        source.insert("app", "a", "v1");

        let id = DocumentId::from("a");
        assert_eq!(source.fetch(&id, "app").await.unwrap(), "v1");
        assert!(matches!(
            source.fetch(&DocumentId::from("missing"), "app").await,
            Err(RemoteError::NotFound { .. })
        ));

        source.fail_fetch("a");
        assert!(matches!(source.fetch(&id, "app").await, Err(RemoteError::Unavailable(_))));
        assert_eq!(source.fetch_calls(), 3);
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let source = MemorySource::new();
        let id = DocumentId::from("a");
        source.insert("app", id.clone(), "v1");

        let (sink, mut rx) = ChangeSink::channel(id.clone());
        source.subscribe(&id, "app", sink).await.unwrap();
        assert!(source.is_subscribed("app", "a"));

        assert!(source.publish("app", "a", "v2"));
        assert_eq!(rx.recv().await.unwrap(), "v2");

        drop(rx);
        assert!(!source.is_subscribed("app", "a"));
        assert!(!source.publish("app", "a", "v3"));
    }

    #[tokio::test]
    async fn test_second_subscription_rejected() {
        let source = MemorySource::new();
        let id = DocumentId::from("a");

        let (first, _rx1) = ChangeSink::channel(id.clone());
        source.subscribe(&id, "app", first).await.unwrap();

        let (second, _rx2) = ChangeSink::channel(id.clone());
        assert!(matches!(
            source.subscribe(&id, "app", second).await,
            Err(RemoteError::SubscriptionFailed { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_subscriptions_admit_one() {
        let source = MemorySource::new();
        let id = DocumentId::from("a");

        let mut handles = Vec::new();
        for _ in 0..16 {
            let source = source.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                let (sink, rx) = ChangeSink::channel(id.clone());
                let result = source.subscribe(&id, "app", sink).await;
                (result.is_ok(), rx)
            }));
        }

        let mut receivers = Vec::new();
        let mut admitted = 0;
        for handle in handles {
            let (ok, rx) = handle.await.unwrap();
            if ok {
                admitted += 1;
            }
            receivers.push(rx);
        }

        assert_eq!(admitted, 1);
        assert_eq!(source.live_subscribers(), 1);
    }

    #[tokio::test]
    async fn test_closed_subscription_can_be_replaced() {
        let source = MemorySource::new();
        let id = DocumentId::from("a");

        let (first, rx1) = ChangeSink::channel(id.clone());
        source.subscribe(&id, "app", first).await.unwrap();
        drop(rx1);

        let (second, mut rx2) = ChangeSink::channel(id.clone());
        source.subscribe(&id, "app", second).await.unwrap();
        assert!(source.publish("app", "a", "v2"));
        assert_eq!(rx2.recv().await.unwrap(), "v2");
    }
}
