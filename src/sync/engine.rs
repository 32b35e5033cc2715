//! Sync orchestrator.
//!
//! # Responsibilities
//! - Discover the documents of the configured group
//! - Fetch, cache, store and subscribe each one before returning
//! - Run one change worker per subscribed document afterwards
//!
//! Startup is all-or-nothing: a discovery or fetch failure returns an error
//! and no engine. Once steady, failures are logged and never propagate.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::validation::validate_config;
use crate::config::{load_config, BootstrapConfig, ConfigError};
use crate::document::DocumentId;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::remote::{ChangeSink, NacosHttpSource, RemoteSource};
use crate::store::{CacheStore, ConfigStore};
use crate::sync::discovery::discover_ids;
use crate::sync::state::{StateTracker, SyncState, SyncStats, SyncStatsSnapshot};
use crate::sync::worker::ChangeWorker;
use crate::sync::{SyncError, SyncResult};

/// A running mirror of one group of remote documents.
pub struct SyncEngine<S: RemoteSource> {
    config: Arc<BootstrapConfig>,
    source: Arc<S>,
    store: ConfigStore,
    cache: CacheStore,
    documents: BTreeSet<DocumentId>,
    subscribed: BTreeSet<DocumentId>,
    stats: Arc<SyncStats>,
    shutdown: Shutdown,
    workers: Vec<JoinHandle<()>>,
    state: SyncState,
}

impl SyncEngine<NacosHttpSource> {
    /// Load the bootstrap file at `path` and start against its Nacos server.
    pub async fn from_file(path: &Path) -> SyncResult<Self> {
        let config = load_config(path)?;
        let source = NacosHttpSource::new(&config).map_err(SyncError::SourceInit)?;
        Self::start(config, source).await
    }
}

impl<S: RemoteSource> SyncEngine<S> {
    /// Discover, load and subscribe every document, then enter steady state.
    ///
    /// Runs on the caller's task and returns only once every discovered
    /// document is in the store. Subscription and cache failures are logged
    /// and tolerated; anything else aborts startup.
    pub async fn start(config: BootstrapConfig, source: S) -> SyncResult<Self> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let config = Arc::new(config);
        let mut state = StateTracker::new();
        let base = &config.base_config;

        tracing::info!(
            group = %base.group,
            filter = %base.data_id,
            search = base.search_pattern.as_str(),
            page_size = base.page_size.get(),
            cache_dir = %base.cache_dir,
            "Starting configuration sync"
        );

        state.advance(SyncState::Discovering);
        let discovered = match discover_ids(
            &source,
            &base.group,
            &base.data_id,
            base.search_pattern,
            base.page_size,
        )
        .await
        {
            Ok(discovered) => discovered,
            Err(e) => {
                state.advance(SyncState::Fatal);
                tracing::error!(group = %base.group, error = %e, "Discovery failed, aborting startup");
                return Err(SyncError::Discovery {
                    group: base.group.clone(),
                    source: e,
                });
            }
        };

        state.advance(SyncState::InitialSyncing);
        let mut engine = Self {
            cache: CacheStore::new(&config.base_config.cache_dir),
            config: Arc::clone(&config),
            source: Arc::new(source),
            store: ConfigStore::new(),
            documents: discovered.ids,
            subscribed: BTreeSet::new(),
            stats: Arc::new(SyncStats::default()),
            shutdown: Shutdown::new(),
            workers: Vec::new(),
            state: state.current(),
        };

        let ids: Vec<DocumentId> = engine.documents.iter().cloned().collect();
        for id in &ids {
            if let Err(e) = engine.sync_document(id).await {
                state.advance(SyncState::Fatal);
                tracing::error!(id = %id, error = %e, "Initial load failed, aborting startup");
                engine.stop_workers().await;
                return Err(e);
            }
        }

        state.advance(SyncState::Steady);
        engine.state = state.current();

        let stats = engine.stats.snapshot();
        tracing::info!(
            documents = engine.documents.len(),
            subscribed = engine.subscribed.len(),
            cache_write_failures = stats.cache_write_failures,
            subscription_failures = stats.subscription_failures,
            "Configuration sync steady"
        );
        Ok(engine)
    }

    /// Fetch → cache → store → subscribe for one document.
    async fn sync_document(&mut self, id: &DocumentId) -> SyncResult<()> {
        let config = Arc::clone(&self.config);
        let group = config.base_config.group.as_str();

        let content = self
            .source
            .fetch(id, group)
            .await
            .map_err(|e| SyncError::InitialFetch {
                id: id.clone(),
                group: group.to_string(),
                source: e,
            })?;

        if let Err(e) = self.cache.write(id, &content).await {
            tracing::warn!(id = %id, error = %e, "Cache write failed during initial sync");
            self.stats.record_cache_write_failure();
            metrics::record_cache_write_failure();
        }

        self.store.set(id.clone(), content);
        self.stats.record_document_synced();
        metrics::record_document_synced();

        let (sink, changes) = ChangeSink::channel(id.clone());
        match self.source.subscribe(id, group, sink).await {
            Ok(()) => {
                let worker = ChangeWorker {
                    id: id.clone(),
                    cache: self.cache.clone(),
                    store: self.store.clone(),
                    stats: Arc::clone(&self.stats),
                };
                let handle = tokio::spawn(worker.run(changes, self.shutdown.subscribe()));
                self.workers.push(handle);
                self.subscribed.insert(id.clone());
                tracing::debug!(id = %id, group = %group, "Document synced and subscribed");
            }
            Err(e) => {
                tracing::warn!(
                    id = %id,
                    group = %group,
                    error = %e,
                    "Subscription failed; document will not receive live updates"
                );
                self.stats.record_subscription_failure();
                metrics::record_subscription_failure();
            }
        }
        Ok(())
    }

    async fn stop_workers(&mut self) {
        self.shutdown.trigger();
        for handle in self.workers.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Change worker ended abnormally");
            }
        }
    }

    /// Stop every change worker and wait for them to finish.
    pub async fn shutdown(mut self) {
        tracing::info!(workers = self.workers.len(), "Stopping configuration sync");
        self.stop_workers().await;
    }

    /// Handle to the in-memory store. Clones observe later updates.
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Every document discovered at startup.
    pub fn documents(&self) -> &BTreeSet<DocumentId> {
        &self.documents
    }

    /// Documents receiving live updates.
    pub fn subscribed(&self) -> &BTreeSet<DocumentId> {
        &self.subscribed
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn stats(&self) -> SyncStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: RemoteSource> Drop for SyncEngine<S> {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

impl<S: RemoteSource> std::fmt::Debug for SyncEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("group", &self.config.base_config.group)
            .field("state", &self.state)
            .field("documents", &self.documents.len())
            .field("subscribed", &self.subscribed.len())
            .finish()
    }
}
