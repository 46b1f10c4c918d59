//! Object store collaborator interface.
//!
//! The pipeline never constructs credentials itself; it receives an
//! already-authenticated [`ObjectStore`] handle and talks to it through this
//! narrow surface: metadata, byte-range reads, streaming writes, deletes,
//! and suffix-filtered key listing.
//!
//! Two implementations ship with the crate:
//!
//! - [`HttpObjectStore`] - an S3-style HTTP gateway backend
//! - [`MemoryObjectStore`] - an in-memory backend for tests and examples

pub mod http;
pub mod memory;

pub use http::HttpObjectStore;
pub use memory::MemoryObjectStore;

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::fmt;

/// Identifies one object in a store. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Container (bucket) name.
    pub container: String,
    /// Object key within the container.
    pub key: String,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.key)
    }
}

/// Metadata returned for an object without fetching its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Total object size in bytes.
    pub size: u64,
}

/// Chunked byte stream handed to [`ObjectStore::put_stream`].
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Capability contract for the remote object store.
///
/// Range semantics: `get_range(obj, start, Some(end))` is the closed
/// interval `[start, end]`; `get_range(obj, start, None)` reads from
/// `start` to the end of the object.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch object metadata. Fails with [`crate::Error::NotFound`] if the
    /// object does not exist.
    async fn metadata(&self, object: &ObjectRef) -> Result<ObjectMeta>;

    /// Fetch a byte range of the object.
    async fn get_range(&self, object: &ObjectRef, start: u64, end: Option<u64>) -> Result<Bytes>;

    /// Upload an object from a chunked byte stream, overwriting any
    /// existing object under the same key.
    async fn put_stream(
        &self,
        object: &ObjectRef,
        body: ByteStream,
        size_hint: Option<u64>,
    ) -> Result<()>;

    /// Delete an object.
    async fn delete(&self, object: &ObjectRef) -> Result<()>;

    /// Enumerate the keys in a container whose name ends with `suffix`.
    async fn list_keys(&self, container: &str, suffix: &str) -> Result<Vec<String>>;
}
