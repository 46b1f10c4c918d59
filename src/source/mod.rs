//! Seekable, readable byte sources.
//!
//! Archive readers need random access: they read a trailing directory
//! structure, then seek to arbitrary member offsets. [`ByteSource`] is the
//! explicit capability contract both strategies implement:
//!
//! - [`MemorySource`] - the whole object buffered in memory
//! - [`RemoteRangeSource`] - every read translated into one byte-range
//!   request against the store
//!
//! A source owns its cursor exclusively and is not safe for concurrent use;
//! independent traversals each take their own [`ByteSource::fork`].

pub mod memory;
pub mod remote;

pub use memory::MemorySource;
pub use remote::RemoteRangeSource;

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::SeekFrom;

/// A byte-addressed source with seek/read semantics.
#[async_trait]
pub trait ByteSource: Send {
    /// Total byte length of the source. Computed once and cached.
    async fn size(&mut self) -> Result<u64>;

    /// Change the cursor position per standard seek semantics and return
    /// the new absolute position.
    ///
    /// Bounds are NOT validated here: a negative or past-the-end position
    /// may be set, and the contract is that the following [`read`] surfaces
    /// the failure from the underlying transfer instead. Position
    /// arithmetic that cannot be represented fails with
    /// [`crate::Error::InvalidSeek`].
    ///
    /// [`read`]: ByteSource::read
    async fn seek(&mut self, pos: SeekFrom) -> Result<i64>;

    /// Read up to `max` bytes from the current position, advancing the
    /// cursor. `None` reads to the end of the source.
    ///
    /// A request reaching past the end returns the remainder (fewer bytes
    /// than asked, signalling near-EOF, not an error). An empty result with
    /// no error happens only at exact EOF. At most one range request is
    /// issued per call.
    async fn read(&mut self, max: Option<u64>) -> Result<Bytes>;

    /// A fresh, independent cursor at position 0 over the same backing
    /// bytes. Cheap: shares the client handle and the cached size, never
    /// the cursor.
    fn fork(&self) -> Box<dyn ByteSource + Send>;
}

/// Resolve a seek target against the current position and total size.
///
/// Shared by both source implementations so their out-of-bounds behavior
/// stays identical.
pub(crate) fn resolve_seek(position: i64, size: u64, pos: SeekFrom) -> Result<i64> {
    use crate::error::Error;
    match pos {
        SeekFrom::Start(offset) => i64::try_from(offset)
            .map_err(|_| Error::InvalidSeek(format!("offset {offset} overflows position"))),
        SeekFrom::Current(delta) => position
            .checked_add(delta)
            .ok_or_else(|| Error::InvalidSeek(format!("position {position} + {delta} overflows"))),
        SeekFrom::End(delta) => (size as i64)
            .checked_add(delta)
            .ok_or_else(|| Error::InvalidSeek(format!("size {size} + {delta} overflows"))),
    }
}
