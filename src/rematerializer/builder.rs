//! Builder for [`Rematerializer`] instances.
//!
//! ```rust
//! use std::sync::Arc;
//! use rezip::{MemoryObjectStore, RematerializerBuilder};
//!
//! let store = Arc::new(MemoryObjectStore::new());
//! let rematerializer = RematerializerBuilder::new()
//!     .threshold(256 * 1024 * 1024)
//!     .suffix(".zip")
//!     .verbose(true)
//!     .build(store);
//! ```

use super::{config::RematerializerConfig, pipeline::Rematerializer};
use crate::progress::{ProgressDisplay, ProgressObserver};
use crate::store::ObjectStore;
use std::sync::Arc;

/// A builder used to create a [`Rematerializer`].
#[derive(Default, Debug)]
pub struct RematerializerBuilder {
    config: RematerializerConfig,
}

impl RematerializerBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        RematerializerBuilder::default()
    }

    /// Set the Buffer/Stream size threshold in bytes.
    pub fn threshold(mut self, threshold: u64) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Set the key suffix used for archive discovery.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.suffix = suffix.into();
        self
    }

    /// Upload members to a different container than the source archives'.
    pub fn destination(mut self, container: impl Into<String>) -> Self {
        self.config.destination = Some(container.into());
        self
    }

    /// Delete each source archive after all of its members uploaded.
    pub fn delete_source(mut self, delete: bool) -> Self {
        self.config.delete_source = delete;
        self
    }

    /// Install a custom progress observer.
    ///
    /// The observer is called synchronously on the upload path with the
    /// member name, cumulative bytes, and the member's declared size.
    pub fn observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Enable terminal progress bars. `verbose(false)` removes any
    /// installed observer.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.observer = match verbose {
            true => Some(Arc::new(ProgressDisplay::default())),
            false => None,
        };
        self
    }

    /// Create the [`Rematerializer`] over an already-authenticated store
    /// handle.
    pub fn build(self, store: Arc<dyn ObjectStore>) -> Rematerializer {
        Rematerializer::new(store, self.config)
    }
}
