//! The re-materialization pipeline.
//!
//! [`Rematerializer`] drives the end-to-end per-key workflow: resolve the
//! archive's size, pick a materialization strategy, open the archive, and
//! upload every member back to the store under its own name. Keys are
//! independent units of work: one bad archive never stops the batch.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rezip::{MemoryObjectStore, RematerializerBuilder};
//!
//! # async fn example() -> Result<(), rezip::Error> {
//! let store = Arc::new(MemoryObjectStore::new());
//! let rematerializer = RematerializerBuilder::new()
//!     .threshold(512 * 1024 * 1024)
//!     .delete_source(true)
//!     .build(store);
//!
//! let summaries = rematerializer.run("my-bucket", &[]).await?;
//! for summary in summaries {
//!     println!("{}: {:?}", summary.key(), summary.status());
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod pipeline;
pub mod summary;

pub use builder::RematerializerBuilder;
pub use config::RematerializerConfig;
pub use pipeline::Rematerializer;
pub use summary::{KeyStatus, KeySummary};
