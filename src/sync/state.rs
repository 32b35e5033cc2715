//! Engine state machine and counters.
//!
//! # States
//! ```text
//! Uninitialized → Discovering → InitialSyncing → Steady
//!                      │               │
//!                      └──→ Fatal ←────┘
//! ```
//!
//! Fatal and Steady are terminal. A fatal startup never yields an engine.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle phase of a sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Uninitialized,
    /// Enumerating document ids.
    Discovering,
    /// Fetching, caching and subscribing each discovered document.
    InitialSyncing,
    /// Applying change notifications.
    Steady,
    /// Startup failed.
    Fatal,
}

impl SyncState {
    pub fn can_transition_to(&self, next: SyncState) -> bool {
        matches!(
            (self, next),
            (SyncState::Uninitialized, SyncState::Discovering)
                | (SyncState::Discovering, SyncState::InitialSyncing)
                | (SyncState::Discovering, SyncState::Fatal)
                | (SyncState::InitialSyncing, SyncState::Steady)
                | (SyncState::InitialSyncing, SyncState::Fatal)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncState::Steady | SyncState::Fatal)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::Uninitialized => "uninitialized",
            SyncState::Discovering => "discovering",
            SyncState::InitialSyncing => "initial_syncing",
            SyncState::Steady => "steady",
            SyncState::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// Tracks the current phase during startup.
#[derive(Debug)]
pub(crate) struct StateTracker {
    current: SyncState,
}

impl StateTracker {
    pub(crate) fn new() -> Self {
        Self {
            current: SyncState::Uninitialized,
        }
    }

    pub(crate) fn current(&self) -> SyncState {
        self.current
    }

    pub(crate) fn advance(&mut self, next: SyncState) {
        debug_assert!(
            self.current.can_transition_to(next),
            "invalid transition {} -> {}",
            self.current,
            next
        );
        tracing::debug!(from = %self.current, to = %next, "Sync state transition");
        self.current = next;
    }
}

/// Counters shared between the engine and its workers.
#[derive(Debug, Default)]
pub struct SyncStats {
    documents_synced: AtomicU64,
    notifications_applied: AtomicU64,
    cache_write_failures: AtomicU64,
    subscription_failures: AtomicU64,
}

impl SyncStats {
    pub(crate) fn record_document_synced(&self) {
        self.documents_synced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_notification_applied(&self) {
        self.notifications_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_write_failure(&self) {
        self.cache_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_subscription_failure(&self) {
        self.subscription_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> SyncStatsSnapshot {
        SyncStatsSnapshot {
            documents_synced: self.documents_synced.load(Ordering::Relaxed),
            notifications_applied: self.notifications_applied.load(Ordering::Relaxed),
            cache_write_failures: self.cache_write_failures.load(Ordering::Relaxed),
            subscription_failures: self.subscription_failures.load(Ordering::Relaxed),
        }
    }
}

/// Copy of [`SyncStats`] at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStatsSnapshot {
    /// Documents loaded during initial sync.
    pub documents_synced: u64,
    /// Change notifications written to the store.
    pub notifications_applied: u64,
    /// Cache writes that failed, at startup or later.
    pub cache_write_failures: u64,
    /// Documents left without live updates.
    pub subscription_failures: u64,
}
