//! In-memory object store backend.
//!
//! Useful for tests and examples: the whole store lives in a shared map, so
//! pipelines run hermetically with no network. Uploads can be made to fail
//! for selected keys to exercise partial-failure behavior.

use crate::error::{Error, Result};
use crate::store::{ByteStream, ObjectMeta, ObjectRef, ObjectStore};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Inner {
    objects: HashMap<ObjectRef, Bytes>,
    failing_puts: HashSet<ObjectRef>,
    failing_deletes: HashSet<ObjectRef>,
}

/// An object store held entirely in memory. Cloning yields a handle to the
/// same underlying store.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object directly, bypassing the streaming path.
    pub fn insert(&self, object: ObjectRef, data: impl Into<Bytes>) {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.objects.insert(object, data.into());
    }

    /// Fetch an object's full content, if present.
    pub fn get(&self, object: &ObjectRef) -> Option<Bytes> {
        let inner = self.inner.lock().expect("store lock poisoned");
        inner.objects.get(object).cloned()
    }

    /// Whether an object exists.
    pub fn contains(&self, object: &ObjectRef) -> bool {
        let inner = self.inner.lock().expect("store lock poisoned");
        inner.objects.contains_key(object)
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().expect("store lock poisoned");
        inner.objects.len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every future upload to `object` fail with a transfer error.
    pub fn fail_puts_to(&self, object: ObjectRef) {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.failing_puts.insert(object);
    }

    /// Make every future delete of `object` fail with a transfer error.
    pub fn fail_deletes_to(&self, object: ObjectRef) {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.failing_deletes.insert(object);
    }

    fn lookup(&self, object: &ObjectRef) -> Result<Bytes> {
        self.get(object).ok_or_else(|| Error::NotFound {
            container: object.container.clone(),
            key: object.key.clone(),
        })
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn metadata(&self, object: &ObjectRef) -> Result<ObjectMeta> {
        let data = self.lookup(object)?;
        Ok(ObjectMeta {
            size: data.len() as u64,
        })
    }

    async fn get_range(&self, object: &ObjectRef, start: u64, end: Option<u64>) -> Result<Bytes> {
        let data = self.lookup(object)?;
        let len = data.len() as u64;
        let end = match end {
            Some(end) => end
                .checked_add(1)
                .ok_or_else(|| Error::transfer("range end overflow"))?,
            None => len,
        };
        if start > len || end > len || start > end {
            return Err(Error::transfer(format!(
                "range {start}-{end} not satisfiable for {object} of {len} bytes"
            )));
        }
        Ok(data.slice(start as usize..end as usize))
    }

    async fn put_stream(
        &self,
        object: &ObjectRef,
        mut body: ByteStream,
        _size_hint: Option<u64>,
    ) -> Result<()> {
        {
            let inner = self.inner.lock().expect("store lock poisoned");
            if inner.failing_puts.contains(object) {
                return Err(Error::transfer(format!("injected upload failure for {object}")));
            }
        }
        let mut buf = BytesMut::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        self.insert(object.clone(), buf.freeze());
        Ok(())
    }

    async fn delete(&self, object: &ObjectRef) -> Result<()> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        if inner.failing_deletes.contains(object) {
            return Err(Error::transfer(format!(
                "injected delete failure for {object}"
            )));
        }
        if inner.objects.remove(object).is_none() {
            return Err(Error::NotFound {
                container: object.container.clone(),
                key: object.key.clone(),
            });
        }
        Ok(())
    }

    async fn list_keys(&self, container: &str, suffix: &str) -> Result<Vec<String>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let mut keys: Vec<String> = inner
            .objects
            .keys()
            .filter(|o| o.container == container && o.key.ends_with(suffix))
            .map(|o| o.key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn obj(key: &str) -> ObjectRef {
        ObjectRef::new("bucket", key)
    }

    #[tokio::test]
    async fn test_metadata_and_ranges() {
        let store = MemoryObjectStore::new();
        store.insert(obj("data"), Bytes::from_static(b"0123456789"));

        assert_eq!(store.metadata(&obj("data")).await.unwrap().size, 10);
        assert_eq!(
            store.get_range(&obj("data"), 2, Some(4)).await.unwrap(),
            Bytes::from_static(b"234")
        );
        assert_eq!(
            store.get_range(&obj("data"), 7, None).await.unwrap(),
            Bytes::from_static(b"789")
        );
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let store = MemoryObjectStore::new();
        assert!(matches!(
            store.metadata(&obj("nope")).await,
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            store.delete(&obj("nope")).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unsatisfiable_range() {
        let store = MemoryObjectStore::new();
        store.insert(obj("data"), Bytes::from_static(b"abc"));
        assert!(matches!(
            store.get_range(&obj("data"), 5, None).await,
            Err(Error::Transfer { .. })
        ));
    }

    #[tokio::test]
    async fn test_put_stream_collects_chunks() {
        let store = MemoryObjectStore::new();
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ])
        .boxed();
        store.put_stream(&obj("greeting"), body, Some(11)).await.unwrap();
        assert_eq!(
            store.get(&obj("greeting")).unwrap(),
            Bytes::from_static(b"hello world")
        );
    }

    #[tokio::test]
    async fn test_injected_put_failure() {
        let store = MemoryObjectStore::new();
        store.fail_puts_to(obj("blocked"));
        let body = stream::iter(vec![Ok(Bytes::from_static(b"x"))]).boxed();
        assert!(store.put_stream(&obj("blocked"), body, None).await.is_err());
        assert!(!store.contains(&obj("blocked")));
    }

    #[tokio::test]
    async fn test_injected_delete_failure() {
        let store = MemoryObjectStore::new();
        store.insert(obj("pinned"), Bytes::from_static(b"x"));
        store.fail_deletes_to(obj("pinned"));
        assert!(matches!(
            store.delete(&obj("pinned")).await,
            Err(Error::Transfer { .. })
        ));
        // The object survives the failed delete.
        assert!(store.contains(&obj("pinned")));
    }

    #[tokio::test]
    async fn test_list_keys_filters_by_suffix() {
        let store = MemoryObjectStore::new();
        store.insert(obj("b.zip"), Bytes::new());
        store.insert(obj("a.zip"), Bytes::new());
        store.insert(obj("readme.txt"), Bytes::new());
        store.insert(ObjectRef::new("other", "c.zip"), Bytes::new());

        let keys = store.list_keys("bucket", ".zip").await.unwrap();
        assert_eq!(keys, vec!["a.zip", "b.zip"]);
    }
}
