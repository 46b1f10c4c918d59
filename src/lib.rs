//! Rezip re-materializes the contents of remote ZIP archives: each member
//! of an archive living in an object store is uploaded back to the store
//! as an independent object, without ever downloading the archive to disk.
//!
//! Small archives are buffered in memory whole; large ones are read through
//! byte-range requests, fetching only the directory and the members' bytes
//! as the archive reader asks for them.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use reqwest::Url;
//! use rezip::{
//!     create_http_client, HttpClientConfig, HttpObjectStore, RematerializerBuilder,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_http_client(HttpClientConfig::default())?;
//! let endpoint = Url::parse("http://localhost:9000")?;
//! let store = Arc::new(HttpObjectStore::new(client, endpoint));
//!
//! let rematerializer = RematerializerBuilder::new()
//!     .verbose(true)
//!     .build(store);
//!
//! // Unpack every *.zip object in the bucket back into the bucket.
//! let summaries = rematerializer.run("my-bucket", &[]).await?;
//! for summary in &summaries {
//!     println!("{}: {:?}", summary.key(), summary.status());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`store`] - the object-store collaborator interface and backends
//! - [`source`] - seekable byte sources (buffered and range-fetching)
//! - [`policy`] - the Buffer/Stream size-threshold decision
//! - [`archive`] - ZIP directory parsing and member streaming
//! - [`rematerializer`] - the end-to-end pipeline
//! - [`progress`] - per-member upload progress reporting
//! - [`http`] - HTTP client construction with retry/tracing middleware
//! - [`error`] - centralized error handling

pub mod archive;
pub mod error;
pub mod http;
pub mod policy;
pub mod progress;
pub mod rematerializer;
pub mod source;
pub mod store;

pub use archive::{MemberStream, ZipCursor, ZipEntry};
pub use error::{Error, Result};
pub use http::{create_http_client, HttpClientConfig};
pub use policy::{decide, Strategy, DEFAULT_THRESHOLD};
pub use progress::{ProgressBarOpts, ProgressDisplay, ProgressObserver};
pub use rematerializer::{KeyStatus, KeySummary, Rematerializer, RematerializerBuilder};
pub use source::{ByteSource, MemorySource, RemoteRangeSource};
pub use store::{ByteStream, HttpObjectStore, MemoryObjectStore, ObjectMeta, ObjectRef, ObjectStore};
