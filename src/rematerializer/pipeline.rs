//! Core pipeline implementation.
//!
//! Per archive key the workflow is: resolve size, pick a strategy,
//! construct the byte source, open the archive directory, then upload each
//! member's decompressed stream to the destination container under the
//! member's own name. Keys and members are processed strictly sequentially,
//! in enumeration order; a failure anywhere marks the enclosing key failed
//! and processing moves on to the next key.

use super::config::RematerializerConfig;
use super::summary::KeySummary;
use crate::archive::{MemberStream, ZipCursor, ZipEntry};
use crate::error::{Error, Result};
use crate::policy::{decide, Strategy};
use crate::source::{ByteSource, MemorySource, RemoteRangeSource};
use crate::store::{ByteStream, ObjectRef, ObjectStore};

use bytes::Bytes;
use futures::stream;
use futures::{StreamExt, TryStreamExt};
use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Re-materializes remote archives: every member of every processed
/// archive key ends up as an independent object in the destination
/// container.
///
/// Created via [`RematerializerBuilder`](crate::RematerializerBuilder):
///
/// ```rust
/// use std::sync::Arc;
/// use rezip::{MemoryObjectStore, RematerializerBuilder};
///
/// let store = Arc::new(MemoryObjectStore::new());
/// let r = RematerializerBuilder::new().build(store);
/// ```
#[derive(Clone)]
pub struct Rematerializer {
    store: Arc<dyn ObjectStore>,
    config: RematerializerConfig,
}

impl Debug for Rematerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rematerializer")
            .field("config", &self.config)
            .finish()
    }
}

impl Rematerializer {
    /// Creates a new Rematerializer with the given configuration.
    pub(crate) fn new(store: Arc<dyn ObjectStore>, config: RematerializerConfig) -> Self {
        Self { store, config }
    }

    /// Gets the pipeline configuration.
    pub fn config(&self) -> &RematerializerConfig {
        &self.config
    }

    /// Process archive keys in `container`.
    ///
    /// When `keys` is empty, candidates are discovered by listing the
    /// container for keys matching the configured suffix. Returns one
    /// [`KeySummary`] per key, in processing order; per-key failures are
    /// captured in the summaries, while configuration and discovery
    /// failures are fatal and surface as an `Err` before any key is
    /// touched.
    pub async fn run(&self, container: &str, keys: &[String]) -> Result<Vec<KeySummary>> {
        if container.is_empty() {
            return Err(Error::Configuration("no container name supplied".into()));
        }

        let keys: Vec<String> = if keys.is_empty() {
            let discovered = self
                .store
                .list_keys(container, &self.config.suffix)
                .await?;
            info!(
                "discovered {} candidate archive(s) in {} with suffix {}",
                discovered.len(),
                container,
                self.config.suffix
            );
            discovered
        } else {
            keys.to_vec()
        };

        let mut summaries = Vec::with_capacity(keys.len());
        for key in &keys {
            summaries.push(self.process_key(container, key).await);
        }
        Ok(summaries)
    }

    /// Run one archive key through the full workflow.
    async fn process_key(&self, container: &str, key: &str) -> KeySummary {
        let object = ObjectRef::new(container, key);
        let mut summary = KeySummary::new(key);

        let size = match self.store.metadata(&object).await {
            Ok(meta) => meta.size,
            Err(e) => {
                warn!("{}: {}", object, e);
                return summary.fail(e);
            }
        };
        summary.set_archive_size(size);

        let strategy = decide(size, self.config.threshold);
        summary.set_strategy(strategy);
        let source: Box<dyn ByteSource + Send> = match strategy {
            Strategy::Buffer => {
                info!(
                    "{}: {} bytes is at or below the {} byte threshold, buffering whole object",
                    object, size, self.config.threshold
                );
                match self.store.get_range(&object, 0, None).await {
                    Ok(data) => Box::new(MemorySource::new(data)),
                    Err(e) => {
                        warn!("{}: buffering failed: {}", object, e);
                        return summary.fail(e);
                    }
                }
            }
            Strategy::Stream => {
                info!(
                    "{}: {} bytes exceeds the {} byte threshold, streaming by byte range",
                    object, size, self.config.threshold
                );
                Box::new(RemoteRangeSource::with_size(
                    Arc::clone(&self.store),
                    object.clone(),
                    size,
                ))
            }
        };

        let cursor = match ZipCursor::open(source).await {
            Ok(cursor) => cursor,
            Err(e) => {
                warn!("{}: {}", object, e);
                return summary.fail(e);
            }
        };

        let destination = self.config.destination.as_deref().unwrap_or(container);
        let entries: Vec<ZipEntry> = cursor.members().to_vec();
        for entry in &entries {
            debug!(
                "{}: uploading member {} ({} bytes) to {}",
                object, entry.name, entry.uncompressed_size, destination
            );
            match self.upload_member(&cursor, entry, destination).await {
                Ok(()) => summary.record_member(entry.uncompressed_size),
                Err(e) => {
                    warn!("{}: member {} failed: {}", object, entry.name, e);
                    return summary.fail(format!("member {}: {e}", entry.name));
                }
            }
        }

        // The source archive is only ever deleted once every member made
        // it to the destination.
        if self.config.delete_source {
            info!("{}: deleting source archive", object);
            if let Err(e) = self.store.delete(&object).await {
                warn!("{}: delete failed: {}", object, e);
                return summary.fail(format!("deleting source: {e}"));
            }
            summary.set_deleted();
        }

        summary.completed()
    }

    /// Open one member and upload its decompressed stream under the
    /// member's own name (no path translation).
    async fn upload_member(
        &self,
        cursor: &ZipCursor,
        entry: &ZipEntry,
        destination: &str,
    ) -> Result<()> {
        let member = cursor.open_member(entry).await?;
        let target = ObjectRef::new(destination, entry.name.clone());
        let body = self.member_body(member, &entry.name, entry.uncompressed_size);
        self.store
            .put_stream(&target, body, Some(entry.uncompressed_size))
            .await
    }

    /// Adapt a member stream into an upload body, reporting cumulative
    /// progress to the observer as chunks are handed to the transport.
    fn member_body(&self, member: MemberStream, name: &str, total: u64) -> ByteStream {
        let chunks = stream::try_unfold(member, |mut member| async move {
            Ok::<_, Error>(member.next_chunk().await?.map(|chunk| (chunk, member)))
        });

        match &self.config.observer {
            None => chunks.boxed(),
            Some(observer) => {
                let observer = Arc::clone(observer);
                let name = name.to_string();
                let mut transferred = 0u64;
                chunks
                    .inspect_ok(move |chunk: &Bytes| {
                        transferred += chunk.len() as u64;
                        observer.on_progress(&name, transferred, total);
                    })
                    .boxed()
            }
        }
    }
}
