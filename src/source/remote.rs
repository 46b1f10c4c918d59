//! Remote byte source backed by range requests.

use crate::error::{Error, Result};
use crate::source::{resolve_seek, ByteSource};
use crate::store::{ObjectRef, ObjectStore};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::SeekFrom;
use std::sync::Arc;
use tracing::trace;

/// Makes a remote object behave like a local seekable, readable stream,
/// fetching only the bytes actually requested.
///
/// There is no read-ahead or caching beyond the current call: an archive
/// reader's own access pattern (a few seeks into the directory, then
/// sequential reads per member) is request-efficient enough without it.
/// The cursor is owned exclusively by this instance; concurrent traversals
/// must each use their own [`fork`](ByteSource::fork).
#[derive(Clone)]
pub struct RemoteRangeSource {
    store: Arc<dyn ObjectStore>,
    object: ObjectRef,
    position: i64,
    size: Option<u64>,
}

impl RemoteRangeSource {
    /// Create a source over one remote object. The size is fetched lazily
    /// on first use and cached.
    pub fn new(store: Arc<dyn ObjectStore>, object: ObjectRef) -> Self {
        Self {
            store,
            object,
            position: 0,
            size: None,
        }
    }

    /// Create a source with an already-known object size, avoiding a
    /// second metadata round-trip when the caller resolved it beforehand.
    pub fn with_size(store: Arc<dyn ObjectStore>, object: ObjectRef, size: u64) -> Self {
        Self {
            store,
            object,
            position: 0,
            size: Some(size),
        }
    }

    /// The object this source reads from.
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    fn start_offset(&self) -> Result<u64> {
        u64::try_from(self.position).map_err(|_| {
            Error::transfer(format!(
                "range start {} is before the beginning of {}",
                self.position, self.object
            ))
        })
    }
}

#[async_trait]
impl ByteSource for RemoteRangeSource {
    async fn size(&mut self) -> Result<u64> {
        if let Some(size) = self.size {
            return Ok(size);
        }
        let meta = self.store.metadata(&self.object).await?;
        self.size = Some(meta.size);
        Ok(meta.size)
    }

    async fn seek(&mut self, pos: SeekFrom) -> Result<i64> {
        let size = self.size().await?;
        self.position = resolve_seek(self.position, size, pos)?;
        Ok(self.position)
    }

    async fn read(&mut self, max: Option<u64>) -> Result<Bytes> {
        let size = self.size().await? as i64;
        if max == Some(0) {
            return Ok(Bytes::new());
        }

        // A bounded read reaching past the end degrades to the
        // read-to-end path: the remainder is returned, signalling
        // near-EOF. A length too large to even represent reaches past
        // any object.
        let to_end = match max {
            None => true,
            Some(max) => i64::try_from(max)
                .ok()
                .and_then(|max| self.position.checked_add(max))
                .map_or(true, |end| end >= size),
        };

        if to_end {
            if self.position == size {
                // True EOF: zero bytes, no error, no request.
                return Ok(Bytes::new());
            }
            let start = self.start_offset()?;
            trace!("open-ended range fetch of {} from {}", self.object, start);
            let data = self.store.get_range(&self.object, start, None).await?;
            self.position = size;
            Ok(data)
        } else {
            let max = max.expect("bounded read");
            let start = self.start_offset()?;
            let end = start + max - 1;
            trace!("range fetch of {} [{}-{}]", self.object, start, end);
            let data = self.store.get_range(&self.object, start, Some(end)).await?;
            self.position += max as i64;
            Ok(data)
        }
    }

    fn fork(&self) -> Box<dyn ByteSource + Send> {
        Box::new(Self {
            store: Arc::clone(&self.store),
            object: self.object.clone(),
            position: 0,
            size: self.size,
        })
    }
}
