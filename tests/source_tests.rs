//! Tests for the byte-source layer: seek/read semantics of the remote
//! range source and its interaction with the archive cursor.

use bytes::Bytes;
use rezip::{ByteSource, MemoryObjectStore, ObjectRef, RemoteRangeSource, ZipCursor};
use std::io::SeekFrom;
use std::sync::Arc;

mod common;
use common::helpers::*;

fn remote_source(data: Vec<u8>) -> RemoteRangeSource {
    let store = MemoryObjectStore::new();
    let object = ObjectRef::new(TEST_CONTAINER, "blob.bin");
    store.insert(object.clone(), Bytes::from(data));
    RemoteRangeSource::new(Arc::new(store), object)
}

#[tokio::test]
async fn test_seek_end_lands_at_size() {
    let mut src = remote_source(test_content(4096));
    assert_eq!(src.seek(SeekFrom::End(0)).await.unwrap(), 4096);
    // Reading at EOF yields zero bytes and no error.
    assert_eq!(src.read(None).await.unwrap(), Bytes::new());
}

#[tokio::test]
async fn test_split_reads_match_single_read() {
    let data = test_content(4096);
    // read(k) then read(m) must return the same bytes as one read(k + m),
    // from a handful of starting offsets.
    for (offset, k, m) in [(0u64, 100u64, 200u64), (17, 1, 1), (1000, 512, 512), (4000, 50, 46)] {
        let mut split = remote_source(data.clone());
        let mut whole = remote_source(data.clone());
        split.seek(SeekFrom::Start(offset)).await.unwrap();
        whole.seek(SeekFrom::Start(offset)).await.unwrap();

        let first = split.read(Some(k)).await.unwrap();
        let second = split.read(Some(m)).await.unwrap();
        let combined = whole.read(Some(k + m)).await.unwrap();
        assert_eq!([first, second].concat(), combined, "offset {offset}, k {k}, m {m}");
    }
}

#[tokio::test]
async fn test_read_never_advances_past_size() {
    let mut src = remote_source(test_content(100));
    src.seek(SeekFrom::Start(90)).await.unwrap();
    let tail = src.read(Some(1000)).await.unwrap();
    assert_eq!(tail.len(), 10);
    assert_eq!(src.seek(SeekFrom::Current(0)).await.unwrap(), 100);
}

#[tokio::test]
async fn test_relative_and_end_seeks() {
    let mut src = remote_source(test_content(100));
    src.seek(SeekFrom::Start(40)).await.unwrap();
    assert_eq!(src.seek(SeekFrom::Current(10)).await.unwrap(), 50);
    assert_eq!(src.seek(SeekFrom::Current(-20)).await.unwrap(), 30);
    assert_eq!(src.seek(SeekFrom::End(-30)).await.unwrap(), 70);
    assert_eq!(src.read(None).await.unwrap().len(), 30);
}

#[tokio::test]
async fn test_out_of_range_seek_fails_at_read_time() {
    let mut src = remote_source(test_content(100));
    // Seeking out of bounds is allowed...
    assert_eq!(src.seek(SeekFrom::End(50)).await.unwrap(), 150);
    // ...the failure surfaces from the transfer on the next read.
    assert!(src.read(Some(10)).await.is_err());
}

#[tokio::test]
async fn test_archive_cursor_over_remote_source() {
    let members = vec![
        stored("x.txt", b"0123456789"),
        deflated("y/z.bin", &test_content(100_000)),
    ];
    let zip = build_zip(&members);
    let store = MemoryObjectStore::new();
    let object = ObjectRef::new(TEST_CONTAINER, "a.zip");
    store.insert(object.clone(), Bytes::from(zip));

    let source = RemoteRangeSource::new(Arc::new(store), object);
    let cursor = ZipCursor::open(Box::new(source)).await.unwrap();
    assert_eq!(cursor.members().len(), 2);

    // Round-trip: each member decompressed over range fetches matches the
    // original content.
    for (entry, member) in cursor.members().to_vec().iter().zip(&members) {
        assert_eq!(entry.name, member.name);
        let mut stream = cursor.open_member(entry).await.unwrap();
        let mut out = Vec::new();
        while let Some(chunk) = stream.next_chunk().await.unwrap() {
            out.extend_from_slice(&chunk);
        }
        assert_eq!(out, member.data, "member {} did not round-trip", member.name);
    }
}
