#![allow(dead_code)]

use bytes::Bytes;
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};
use rezip::{MemoryObjectStore, ObjectRef, ProgressObserver};
use std::io::Write;
use std::sync::Mutex;

// Common test constants
pub const TEST_CONTAINER: &str = "test-bucket";

/// Installs a tracing subscriber honoring `RUST_LOG`. Safe to call from
/// every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One member to put into a fixture archive.
pub struct Member {
    pub name: String,
    pub data: Vec<u8>,
    pub deflate: bool,
}

/// Creates a stored (uncompressed) fixture member.
pub fn stored(name: &str, data: &[u8]) -> Member {
    Member {
        name: name.to_string(),
        data: data.to_vec(),
        deflate: false,
    }
}

/// Creates a deflated fixture member.
pub fn deflated(name: &str, data: &[u8]) -> Member {
    Member {
        name: name.to_string(),
        data: data.to_vec(),
        deflate: true,
    }
}

/// Creates deterministic test content of the given size.
pub fn test_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// Builds a single-disk ZIP archive in memory.
pub fn build_zip(members: &[Member]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut directory = Vec::new();

    for m in members {
        let method: u16 = if m.deflate { 8 } else { 0 };
        let compressed = if m.deflate {
            let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
            enc.write_all(&m.data).expect("deflate write");
            enc.finish().expect("deflate finish")
        } else {
            m.data.clone()
        };
        let mut crc = Crc::new();
        crc.update(&m.data);

        let offset = out.len() as u32;
        out.extend_from_slice(b"PK\x03\x04");
        out.extend_from_slice(&20u16.to_le_bytes()); // version needed
        out.extend_from_slice(&0u16.to_le_bytes()); // flags
        out.extend_from_slice(&method.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // dos time/date
        out.extend_from_slice(&crc.sum().to_le_bytes());
        out.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        out.extend_from_slice(&(m.data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(m.name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // extra len
        out.extend_from_slice(m.name.as_bytes());
        out.extend_from_slice(&compressed);

        directory.extend_from_slice(b"PK\x01\x02");
        directory.extend_from_slice(&20u16.to_le_bytes()); // version made by
        directory.extend_from_slice(&20u16.to_le_bytes()); // version needed
        directory.extend_from_slice(&0u16.to_le_bytes()); // flags
        directory.extend_from_slice(&method.to_le_bytes());
        directory.extend_from_slice(&0u32.to_le_bytes()); // dos time/date
        directory.extend_from_slice(&crc.sum().to_le_bytes());
        directory.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        directory.extend_from_slice(&(m.data.len() as u32).to_le_bytes());
        directory.extend_from_slice(&(m.name.len() as u16).to_le_bytes());
        directory.extend_from_slice(&0u16.to_le_bytes()); // extra len
        directory.extend_from_slice(&0u16.to_le_bytes()); // comment len
        directory.extend_from_slice(&0u16.to_le_bytes()); // disk number
        directory.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        directory.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        directory.extend_from_slice(&offset.to_le_bytes());
        directory.extend_from_slice(m.name.as_bytes());
    }

    let cd_offset = out.len() as u32;
    let cd_size = directory.len() as u32;
    out.extend_from_slice(&directory);
    out.extend_from_slice(b"PK\x05\x06");
    out.extend_from_slice(&0u16.to_le_bytes()); // disk number
    out.extend_from_slice(&0u16.to_le_bytes()); // cd start disk
    out.extend_from_slice(&(members.len() as u16).to_le_bytes());
    out.extend_from_slice(&(members.len() as u16).to_le_bytes());
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // comment len
    out
}

/// Builds an archive and seeds it into the store under the given key.
pub fn seed_archive(store: &MemoryObjectStore, key: &str, members: &[Member]) {
    let zip = build_zip(members);
    store.insert(ObjectRef::new(TEST_CONTAINER, key), Bytes::from(zip));
}

/// Fetches a destination object's content as a Vec.
pub fn fetch(store: &MemoryObjectStore, container: &str, key: &str) -> Option<Vec<u8>> {
    store
        .get(&ObjectRef::new(container, key))
        .map(|b| b.to_vec())
}

/// Records every progress callback for later inspection.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(String, u64, u64)>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(member, transferred, total)` events, in order.
    pub fn events(&self) -> Vec<(String, u64, u64)> {
        self.events.lock().expect("observer lock").clone()
    }

    /// Events for one member only.
    pub fn events_for(&self, member: &str) -> Vec<(u64, u64)> {
        self.events()
            .into_iter()
            .filter(|(name, _, _)| name == member)
            .map(|(_, transferred, total)| (transferred, total))
            .collect()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_progress(&self, member: &str, transferred: u64, total: u64) {
        self.events
            .lock()
            .expect("observer lock")
            .push((member.to_string(), transferred, total));
    }
}

/// Asserts that a member's recorded progress is monotonically
/// non-decreasing and ends exactly at its declared size.
pub fn assert_progress_complete(observer: &RecordingObserver, member: &str, expected_total: u64) {
    let events = observer.events_for(member);
    assert!(
        !events.is_empty(),
        "no progress was reported for {member}"
    );
    let mut last = 0;
    for (transferred, total) in &events {
        assert_eq!(*total, expected_total, "wrong total for {member}");
        assert!(
            *transferred >= last,
            "progress went backwards for {member}: {transferred} < {last}"
        );
        last = *transferred;
    }
    assert_eq!(
        last, expected_total,
        "progress for {member} never reached its declared size"
    );
}
