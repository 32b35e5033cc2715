//! Document identity and content types.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identifier of a configuration document, unique within its group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DocumentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Content of a document at a point in time.
///
/// Opaque bytes; no text encoding is assumed. Clones share the underlying
/// buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentContent(Arc<[u8]>);

impl DocumentContent {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The content as UTF-8 text, if it is valid UTF-8.
    pub fn to_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Lossy: invalid UTF-8 sequences are shown as U+FFFD.
impl fmt::Display for DocumentContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl From<Vec<u8>> for DocumentContent {
    fn from(content: Vec<u8>) -> Self {
        Self(Arc::from(content))
    }
}

impl From<&[u8]> for DocumentContent {
    fn from(content: &[u8]) -> Self {
        Self(Arc::from(content))
    }
}

impl From<String> for DocumentContent {
    fn from(content: String) -> Self {
        Self::from(content.into_bytes())
    }
}

impl From<&str> for DocumentContent {
    fn from(content: &str) -> Self {
        Self::from(content.as_bytes())
    }
}

impl PartialEq<str> for DocumentContent {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for DocumentContent {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == other.as_bytes()
    }
}

impl PartialEq<[u8]> for DocumentContent {
    fn eq(&self, other: &[u8]) -> bool {
        &*self.0 == other
    }
}
