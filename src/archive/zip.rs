//! ZIP directory parsing and member streaming.
//!
//! A ZIP archive keeps its directory at the tail: an end-of-central-directory
//! (EOCD) record pointing at the central directory, which in turn points at
//! each member's local header. Opening a [`ZipCursor`] therefore needs only
//! a couple of bounded reads near the end of the byte source; member content
//! is pulled on demand, one bounded read at a time.

use crate::error::{Error, Result};
use crate::source::ByteSource;
use bytes::{Buf, Bytes};
use flate2::{Decompress, FlushDecompress, Status};
use std::io::SeekFrom;
use tracing::debug;

const EOCD_SIGNATURE: &[u8; 4] = b"\x50\x4b\x05\x06";
const CENTRAL_DIR_SIGNATURE: &[u8; 4] = b"\x50\x4b\x01\x02";
const LOCAL_HEADER_SIGNATURE: &[u8; 4] = b"\x50\x4b\x03\x04";

const COMPRESSION_STORED: u16 = 0;
const COMPRESSION_DEFLATE: u16 = 8;

const EOCD_MIN_SIZE: usize = 22;
const CENTRAL_DIR_ENTRY_MIN_SIZE: usize = 46;
const LOCAL_HEADER_MIN_SIZE: usize = 30;

/// The EOCD record sits within the last 64 KiB of the archive (22 bytes
/// plus a comment of at most 65535).
const EOCD_SEARCH_SIZE: u64 = 65536;

/// Compressed bytes are pulled from the source in chunks of this size.
const MEMBER_FETCH_CHUNK: u64 = 1 << 20;

/// One member of a ZIP archive, as recorded in its central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    /// Member name, including any internal path separators.
    pub name: String,
    /// Compression method (0 = Stored, 8 = Deflate).
    pub compression_method: u16,
    /// Size of the member's compressed data.
    pub compressed_size: u64,
    /// Declared size of the member once decompressed.
    pub uncompressed_size: u64,
    /// Byte offset of the member's local header within the archive.
    pub local_header_offset: u64,
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// An opened archive: the parsed member directory plus the byte source it
/// was parsed from.
///
/// Member streams fork the source, so multiple members can be opened
/// independently; each fork issues its own range fetches keyed by its own
/// cursor.
pub struct ZipCursor {
    source: Box<dyn ByteSource + Send>,
    entries: Vec<ZipEntry>,
}

impl std::fmt::Debug for ZipCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipCursor")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl ZipCursor {
    /// Parse the archive directory at the tail of `source`.
    ///
    /// Fails with [`Error::CorruptArchive`] if the EOCD record cannot be
    /// located or the central directory does not parse.
    pub async fn open(mut source: Box<dyn ByteSource + Send>) -> Result<Self> {
        let size = source.size().await?;
        if size < EOCD_MIN_SIZE as u64 {
            return Err(Error::CorruptArchive(format!(
                "{size} bytes is too small to hold an end-of-central-directory record"
            )));
        }

        let tail_len = EOCD_SEARCH_SIZE.min(size);
        source.seek(SeekFrom::End(-(tail_len as i64))).await?;
        let tail = source.read(Some(tail_len)).await?;
        if tail.len() as u64 != tail_len {
            return Err(Error::CorruptArchive("archive tail is truncated".into()));
        }

        let eocd_pos = tail
            .windows(4)
            .rposition(|window| window == EOCD_SIGNATURE)
            .ok_or_else(|| {
                Error::CorruptArchive("end-of-central-directory record not found".into())
            })?;
        let eocd = &tail[eocd_pos..];
        if eocd.len() < EOCD_MIN_SIZE {
            return Err(Error::CorruptArchive(
                "end-of-central-directory record is truncated".into(),
            ));
        }

        let entry_count = read_u16(eocd, 10);
        let cd_size = read_u32(eocd, 12) as u64;
        let cd_offset = read_u32(eocd, 16) as u64;
        if entry_count == u16::MAX || cd_size == u32::MAX as u64 || cd_offset == u32::MAX as u64 {
            return Err(Error::CorruptArchive(
                "zip64 archives are not supported".into(),
            ));
        }

        let tail_start = size - tail_len;
        let eocd_abs = tail_start + eocd_pos as u64;
        if cd_offset + cd_size > eocd_abs {
            return Err(Error::CorruptArchive(
                "central directory extends past its end record".into(),
            ));
        }

        // The directory usually sits inside the tail window already; only
        // fetch it separately when it does not.
        let cd_data = if cd_offset >= tail_start {
            let start = (cd_offset - tail_start) as usize;
            tail.slice(start..start + cd_size as usize)
        } else {
            source.seek(SeekFrom::Start(cd_offset)).await?;
            source.read(Some(cd_size)).await?
        };
        if cd_data.len() as u64 != cd_size {
            return Err(Error::CorruptArchive(
                "central directory is truncated".into(),
            ));
        }

        let entries = parse_central_directory(&cd_data, entry_count)?;
        debug!("opened archive with {} members", entries.len());
        Ok(Self { source, entries })
    }

    /// The archive's members, in stored directory order (the order they
    /// were written into the archive, not necessarily alphabetical).
    pub fn members(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Open a sequential, forward-only decompressing stream over one
    /// member's content.
    pub async fn open_member(&self, entry: &ZipEntry) -> Result<MemberStream> {
        if entry.compression_method != COMPRESSION_STORED
            && entry.compression_method != COMPRESSION_DEFLATE
        {
            return Err(Error::UnsupportedCompression(entry.compression_method));
        }

        let mut source = self.source.fork();
        source.seek(SeekFrom::Start(entry.local_header_offset)).await?;
        let header = source.read(Some(LOCAL_HEADER_MIN_SIZE as u64)).await?;
        if header.len() < LOCAL_HEADER_MIN_SIZE || &header[..4] != LOCAL_HEADER_SIGNATURE {
            return Err(Error::CorruptArchive(format!(
                "bad local header for member {}",
                entry.name
            )));
        }

        // The local header repeats the name and extra field with its own
        // lengths; trust those for locating the data.
        let name_len = read_u16(&header, 26) as u64;
        let extra_len = read_u16(&header, 28) as u64;
        let data_start =
            entry.local_header_offset + LOCAL_HEADER_MIN_SIZE as u64 + name_len + extra_len;
        source.seek(SeekFrom::Start(data_start)).await?;

        let inflater = match entry.compression_method {
            COMPRESSION_DEFLATE => Some(Decompress::new(false)),
            _ => None,
        };
        Ok(MemberStream {
            source,
            name: entry.name.clone(),
            remaining_compressed: entry.compressed_size,
            total_uncompressed: entry.uncompressed_size,
            produced: 0,
            inflater,
            in_buf: Bytes::new(),
            finished: false,
        })
    }
}

fn parse_central_directory(cd_data: &[u8], expected_entries: u16) -> Result<Vec<ZipEntry>> {
    let mut entries = Vec::with_capacity(expected_entries as usize);
    let mut offset = 0;

    while offset + CENTRAL_DIR_ENTRY_MIN_SIZE <= cd_data.len() {
        if &cd_data[offset..offset + 4] != CENTRAL_DIR_SIGNATURE {
            return Err(Error::CorruptArchive(format!(
                "bad central directory entry signature at offset {offset}"
            )));
        }

        let compression_method = read_u16(cd_data, offset + 10);
        let compressed_size = read_u32(cd_data, offset + 20) as u64;
        let uncompressed_size = read_u32(cd_data, offset + 24) as u64;
        let name_len = read_u16(cd_data, offset + 28) as usize;
        let extra_len = read_u16(cd_data, offset + 30) as usize;
        let comment_len = read_u16(cd_data, offset + 32) as usize;
        let local_header_offset = read_u32(cd_data, offset + 42) as u64;

        if compressed_size == u32::MAX as u64
            || uncompressed_size == u32::MAX as u64
            || local_header_offset == u32::MAX as u64
        {
            return Err(Error::CorruptArchive(
                "zip64 archives are not supported".into(),
            ));
        }

        let name_start = offset + CENTRAL_DIR_ENTRY_MIN_SIZE;
        let entry_end = name_start + name_len + extra_len + comment_len;
        if name_start + name_len > cd_data.len() || entry_end > cd_data.len() {
            return Err(Error::CorruptArchive(
                "central directory entry is truncated".into(),
            ));
        }

        let name = String::from_utf8_lossy(&cd_data[name_start..name_start + name_len]).into_owned();
        entries.push(ZipEntry {
            name,
            compression_method,
            compressed_size,
            uncompressed_size,
            local_header_offset,
        });
        offset = entry_end;
    }

    if offset != cd_data.len() || entries.len() != expected_entries as usize {
        return Err(Error::CorruptArchive(format!(
            "central directory holds {} entries, end record declares {}",
            entries.len(),
            expected_entries
        )));
    }
    Ok(entries)
}

/// A sequential, forward-only decompressing stream over one member's
/// content.
///
/// Owns an independent fork of the archive's byte source; compressed bytes
/// are pulled in bounded chunks and inflated incrementally, so a member is
/// never buffered whole. Produces exactly the member's declared
/// uncompressed size, or fails with [`Error::CorruptArchive`].
pub struct MemberStream {
    source: Box<dyn ByteSource + Send>,
    name: String,
    remaining_compressed: u64,
    total_uncompressed: u64,
    produced: u64,
    /// `None` for Stored members.
    inflater: Option<Decompress>,
    in_buf: Bytes,
    finished: bool,
}

impl std::fmt::Debug for MemberStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberStream")
            .field("name", &self.name)
            .field("remaining_compressed", &self.remaining_compressed)
            .field("total_uncompressed", &self.total_uncompressed)
            .field("produced", &self.produced)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl MemberStream {
    /// Member name this stream decodes.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared uncompressed size of the member.
    pub fn total_size(&self) -> u64 {
        self.total_uncompressed
    }

    /// Pull the next decompressed chunk, or `None` once the member is
    /// fully produced.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.finished {
            return self.end_of_member();
        }
        match self.inflater.is_some() {
            true => self.next_deflate_chunk().await,
            false => self.next_stored_chunk().await,
        }
    }

    fn end_of_member(&mut self) -> Result<Option<Bytes>> {
        self.finished = true;
        if self.produced != self.total_uncompressed {
            return Err(Error::CorruptArchive(format!(
                "member {} produced {} bytes, directory declares {}",
                self.name, self.produced, self.total_uncompressed
            )));
        }
        Ok(None)
    }

    async fn fill_input(&mut self) -> Result<()> {
        let want = self.remaining_compressed.min(MEMBER_FETCH_CHUNK);
        let chunk = self.source.read(Some(want)).await?;
        if chunk.is_empty() {
            return Err(Error::CorruptArchive(format!(
                "unexpected end of data in member {}",
                self.name
            )));
        }
        self.remaining_compressed -= chunk.len() as u64;
        self.in_buf = chunk;
        Ok(())
    }

    async fn next_stored_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.remaining_compressed == 0 {
            return self.end_of_member();
        }
        self.fill_input().await?;
        let chunk = std::mem::take(&mut self.in_buf);
        self.produced += chunk.len() as u64;
        if self.produced > self.total_uncompressed {
            return Err(Error::CorruptArchive(format!(
                "member {} is larger than its directory entry declares",
                self.name
            )));
        }
        Ok(Some(chunk))
    }

    async fn next_deflate_chunk(&mut self) -> Result<Option<Bytes>> {
        let mut out = Vec::with_capacity(MEMBER_FETCH_CHUNK as usize);
        let inflater = self.inflater.as_mut().expect("deflate member");

        while out.is_empty() {
            if self.in_buf.is_empty() && self.remaining_compressed > 0 {
                let want = self.remaining_compressed.min(MEMBER_FETCH_CHUNK);
                let chunk = self.source.read(Some(want)).await?;
                if chunk.is_empty() {
                    return Err(Error::CorruptArchive(format!(
                        "unexpected end of data in member {}",
                        self.name
                    )));
                }
                self.remaining_compressed -= chunk.len() as u64;
                self.in_buf = chunk;
            }

            let flush = if self.in_buf.is_empty() && self.remaining_compressed == 0 {
                FlushDecompress::Finish
            } else {
                FlushDecompress::None
            };
            let before_in = inflater.total_in();
            let status = inflater
                .decompress_vec(&self.in_buf, &mut out, flush)
                .map_err(|e| {
                    Error::CorruptArchive(format!("deflate stream in member {}: {e}", self.name))
                })?;
            let consumed = (inflater.total_in() - before_in) as usize;
            self.in_buf.advance(consumed);

            if status == Status::StreamEnd {
                self.finished = true;
                break;
            }
            if consumed == 0
                && out.is_empty()
                && self.in_buf.is_empty()
                && self.remaining_compressed == 0
            {
                return Err(Error::CorruptArchive(format!(
                    "truncated deflate stream in member {}",
                    self.name
                )));
            }
        }

        self.produced += out.len() as u64;
        if self.produced > self.total_uncompressed {
            return Err(Error::CorruptArchive(format!(
                "member {} inflates past its declared size",
                self.name
            )));
        }
        if out.is_empty() {
            // StreamEnd with nothing left over.
            self.finished = false;
            return self.end_of_member();
        }
        Ok(Some(Bytes::from(out)))
    }
}
