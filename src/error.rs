//! Error handling for the rezip library.
//!
//! All fallible operations in the crate return [`Result`]. Per-key failures
//! (missing object, corrupt archive, failed transfer) are isolated by the
//! pipeline; configuration errors are fatal before any key is processed.

use std::io;
use thiserror::Error;

/// Errors that can happen while re-materializing archives.
#[derive(Error, Debug)]
pub enum Error {
    /// The referenced remote object does not exist.
    #[error("object not found: {container}/{key}")]
    NotFound {
        /// Container (bucket) holding the object.
        container: String,
        /// Key of the missing object.
        key: String,
    },

    /// A seek violated the byte-source contract.
    ///
    /// Positions outside the object bounds are permitted at seek time and
    /// only fail on the following read; this variant covers the cases that
    /// cannot even be represented, such as position arithmetic overflow.
    #[error("invalid seek: {0}")]
    InvalidSeek(String),

    /// The archive's central directory could not be located or parsed, or a
    /// member's data is inconsistent with its directory record.
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    /// A member uses a compression method other than Stored or Deflate.
    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    /// An I/O failure while talking to the object store (metadata, range
    /// fetch, upload, delete, or listing).
    #[error("transfer failed: {message}")]
    Transfer {
        /// Human-readable description of the failed operation.
        message: String,
        /// Underlying cause, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    /// Invalid combination of inputs at the boundary, e.g. an empty
    /// container name. Fatal at startup, before any key is processed.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("I/O error")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl Error {
    /// Create an [`Error::Transfer`] without an underlying cause.
    pub(crate) fn transfer(message: impl Into<String>) -> Self {
        Self::Transfer {
            message: message.into(),
            source: None,
        }
    }

    /// Create an [`Error::Transfer`] wrapping an underlying cause.
    pub(crate) fn transfer_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transfer {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::transfer_with("http request failed", e)
    }
}

impl From<reqwest_middleware::Error> for Error {
    fn from(e: reqwest_middleware::Error) -> Self {
        Error::transfer_with("http request failed", e)
    }
}

/// Result type alias for operations that can fail with a rezip [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
