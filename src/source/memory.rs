//! Fully buffered byte source.

use crate::error::{Error, Result};
use crate::source::{resolve_seek, ByteSource};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::SeekFrom;

/// A byte source over an object buffered entirely in memory, selected when
/// the object is small enough per the size policy.
///
/// Follows the same seek/read contract as
/// [`RemoteRangeSource`](crate::RemoteRangeSource), including deferred
/// bounds validation, so the archive cursor treats both identically.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Bytes,
    position: i64,
}

impl MemorySource {
    /// Wrap already-fetched object content.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            position: 0,
        }
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    async fn size(&mut self) -> Result<u64> {
        Ok(self.len())
    }

    async fn seek(&mut self, pos: SeekFrom) -> Result<i64> {
        self.position = resolve_seek(self.position, self.len(), pos)?;
        Ok(self.position)
    }

    async fn read(&mut self, max: Option<u64>) -> Result<Bytes> {
        let size = self.len() as i64;
        if max == Some(0) {
            return Ok(Bytes::new());
        }
        if self.position == size {
            return Ok(Bytes::new());
        }
        if self.position < 0 || self.position > size {
            return Err(Error::transfer(format!(
                "position {} out of bounds for buffered source of {} bytes",
                self.position, size
            )));
        }
        let start = self.position as usize;
        let end = match max {
            None => self.data.len(),
            Some(max) => self.data.len().min(start + max as usize),
        };
        self.position = end as i64;
        Ok(self.data.slice(start..end))
    }

    fn fork(&self) -> Box<dyn ByteSource + Send> {
        Box::new(Self {
            data: self.data.clone(),
            position: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_and_seek() {
        let mut src = MemorySource::new(Bytes::from_static(b"0123456789"));
        assert_eq!(src.size().await.unwrap(), 10);
        assert_eq!(src.read(Some(4)).await.unwrap(), Bytes::from_static(b"0123"));
        src.seek(SeekFrom::End(-2)).await.unwrap();
        assert_eq!(src.read(None).await.unwrap(), Bytes::from_static(b"89"));
        assert_eq!(src.read(None).await.unwrap(), Bytes::new());
    }

    #[tokio::test]
    async fn test_short_read_near_eof() {
        let mut src = MemorySource::new(Bytes::from_static(b"0123456789"));
        src.seek(SeekFrom::Start(8)).await.unwrap();
        assert_eq!(src.read(Some(100)).await.unwrap(), Bytes::from_static(b"89"));
    }

    #[tokio::test]
    async fn test_out_of_bounds_read_fails() {
        let mut src = MemorySource::new(Bytes::from_static(b"0123"));
        src.seek(SeekFrom::Current(-1)).await.unwrap();
        assert!(src.read(Some(1)).await.is_err());
        src.seek(SeekFrom::End(5)).await.unwrap();
        assert!(src.read(None).await.is_err());
    }

    #[tokio::test]
    async fn test_fork_shares_bytes_not_cursor() {
        let mut src = MemorySource::new(Bytes::from_static(b"0123456789"));
        src.read(Some(5)).await.unwrap();
        let mut fork = src.fork();
        assert_eq!(fork.read(Some(2)).await.unwrap(), Bytes::from_static(b"01"));
    }
}
