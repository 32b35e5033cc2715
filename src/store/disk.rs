//! On-disk document cache.
//!
//! One file per document id directly under the cache root, overwritten on
//! every update. Writes are plain overwrites (no temp file + rename), so a
//! crash mid-write can leave a truncated entry until the next update.

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::document::{DocumentContent, DocumentId};

/// Errors from writing a cache entry.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The file could not be written.
    #[error("cache write for '{id}' at {} failed: {source}", .path.display())]
    WriteFailed {
        id: DocumentId,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The id does not name a single file inside the cache root.
    #[error("document id '{0}' cannot be used as a cache file name")]
    InvalidId(DocumentId),
}

/// Durable mirror of the latest content of each document.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Create a cache rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the cache entry for `id`.
    pub fn entry_path(&self, id: &DocumentId) -> Result<PathBuf, CacheError> {
        let mut components = Path::new(id.as_str()).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(id.as_str())),
            _ => Err(CacheError::InvalidId(id.clone())),
        }
    }

    /// Write `content` as the cache entry for `id`, replacing any prior bytes.
    pub async fn write(&self, id: &DocumentId, content: &DocumentContent) -> Result<(), CacheError> {
        let path = self.entry_path(id)?;

        // Directory creation failures surface through the file write below.
        if let Err(e) = tokio::fs::create_dir_all(&self.root).await {
            tracing::debug!(root = %self.root.display(), error = %e, "Cache directory not created");
        }

        tokio::fs::write(&path, content.as_bytes())
            .await
            .map_err(|source| CacheError::WriteFailed {
                id: id.clone(),
                path: path.clone(),
                source,
            })?;

        tracing::trace!(id = %id, path = %path.display(), bytes = content.len(), "Cache entry written");
        Ok(())
    }

    /// Read the cache entry for `id`. `Ok(None)` when no entry exists.
    pub async fn read(&self, id: &DocumentId) -> io::Result<Option<DocumentContent>> {
        let path = self
            .entry_path(id)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        match tokio::fs::read(&path).await {
            Ok(content) => Ok(Some(content.into())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_creates_root_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("cache");
        let cache = CacheStore::new(&root);
        assert!(!root.exists());

        let id = DocumentId::from("app.toml");
        cache.write(&id, &"key = 1".into()).await.unwrap();

        assert_eq!(std::fs::read(root.join("app.toml")).unwrap(), b"key = 1");
        assert_eq!(cache.read(&id).await.unwrap().unwrap(), "key = 1");
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::new(dir.path());
        let id = DocumentId::from("app.toml");

        cache.write(&id, &"a much longer first version".into()).await.unwrap();
        cache.write(&id, &"short".into()).await.unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("app.toml")).unwrap(), "short");
    }

    #[tokio::test]
    async fn test_non_utf8_content_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::new(dir.path());
        let id = DocumentId::from("app.properties");
        let raw: Vec<u8> = vec![b'k', b'=', 0xC4, 0xE3, 0xBA, 0xC3];

        cache.write(&id, &raw.clone().into()).await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("app.properties")).unwrap(), raw);
        assert_eq!(cache.read(&id).await.unwrap().unwrap().as_bytes(), raw.as_slice());
    }

    #[tokio::test]
    async fn test_read_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::new(dir.path());
        assert!(cache.read(&DocumentId::from("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_escaping_root_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::new(dir.path());

        for bad in ["../escape", "/etc/passwd", "a/b", "", ".."] {
            let result = cache.write(&DocumentId::from(bad), &"x".into()).await;
            assert!(matches!(result, Err(CacheError::InvalidId(_))), "accepted '{bad}'");
        }
    }

    #[tokio::test]
    async fn test_unwritable_root_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let cache = CacheStore::new(&blocker);
        let result = cache.write(&DocumentId::from("a"), &"x".into()).await;
        assert!(matches!(result, Err(CacheError::WriteFailed { .. })));
    }
}
