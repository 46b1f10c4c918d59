//! Archive enumeration and member extraction.
//!
//! Turns any [`ByteSource`](crate::ByteSource) into an enumerable sequence
//! of decompressed member streams, without materializing the archive.

pub mod zip;

pub use zip::{MemberStream, ZipCursor, ZipEntry};
