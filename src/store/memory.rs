//! In-memory configuration store read by the hosting application.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::document::{DocumentContent, DocumentId};
use crate::observability::metrics;

/// Errors from resolving a key inside a document.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("document '{id}' is not valid TOML: {source}")]
    Parse {
        id: DocumentId,
        #[source]
        source: toml::de::Error,
    },

    #[error("document '{id}' is not UTF-8 text: {source}")]
    NotUtf8 {
        id: DocumentId,
        #[source]
        source: std::str::Utf8Error,
    },
}

/// A thread-safe map of document id to latest content.
///
/// Clones share the same map. Writers replace whole entries, so a reader
/// always sees a complete value: the one left by the most recently
/// completed `set` for that id.
#[derive(Clone, Default)]
pub struct ConfigStore {
    inner: Arc<DashMap<DocumentId, DocumentContent>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite the entry for `id`.
    pub fn set(&self, id: DocumentId, content: DocumentContent) {
        self.inner.insert(id, content);
        metrics::record_store_size(self.inner.len());
    }

    /// Latest content for `id`, if any.
    pub fn get(&self, id: &str) -> Option<DocumentContent> {
        self.inner.get(id).map(|r| r.value().clone())
    }

    /// Resolve a dotted key such as `server.port` inside a TOML document.
    ///
    /// Returns `Ok(None)` when the document or the key is absent.
    pub fn lookup(&self, id: &str, key: &str) -> Result<Option<toml::Value>, LookupError> {
        let Some(content) = self.get(id) else {
            return Ok(None);
        };
        lookup_key(&DocumentId::from(id), content.as_bytes(), key)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.contains_key(id)
    }

    /// All ids currently held, sorted.
    pub fn ids(&self) -> Vec<DocumentId> {
        let mut ids: Vec<_> = self.inner.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Point-in-time copy of every entry.
    pub fn snapshot(&self) -> HashMap<DocumentId, DocumentContent> {
        self.inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }
}

/// Resolve a dotted key inside a TOML document given as raw bytes.
pub fn lookup_key(id: &DocumentId, content: &[u8], key: &str) -> Result<Option<toml::Value>, LookupError> {
    let text = std::str::from_utf8(content).map_err(|source| LookupError::NotUtf8 {
        id: id.clone(),
        source,
    })?;
    let root: toml::Table = text.parse().map_err(|source| LookupError::Parse {
        id: id.clone(),
        source,
    })?;

    let mut segments = key.split('.');
    let Some(first) = segments.next() else {
        return Ok(None);
    };
    let mut current = match root.get(first) {
        Some(value) => value,
        None => return Ok(None),
    };
    for segment in segments {
        current = match current.get(segment) {
            Some(value) => value,
            None => return Ok(None),
        };
    }
    Ok(Some(current.clone()))
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("documents", &self.inner.len())
            .finish()
    }
}
