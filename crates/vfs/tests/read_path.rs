//! Read-path contracts: positional reads, cursor movement and end-of-file
//! behaviour.

mod common;

use common::{pattern, MockStore};
use sshvfs::{OpenMode, SshFileHandle, SshVfsConfig, SshVfsError};
use std::sync::Arc;

const KIB: usize = 1024;

fn reader(store: &Arc<MockStore>, path: &str) -> SshFileHandle {
    SshFileHandle::new(store.clone(), path, OpenMode::Read, &SshVfsConfig::default())
}

#[tokio::test]
async fn positional_random_access_reads() {
    // 256 KiB of the pattern; 37 bytes at assorted offsets, each slice
    // byte-for-byte equal to the source.
    let size = 256 * KIB;
    let data = pattern(size);
    let store = Arc::new(MockStore::new());
    store.put("data.bin", data.clone());

    let mut handle = reader(&store, "data.bin");
    for offset in [0usize, 1, 1 << 15, size - 37] {
        handle.seek(offset as u64);
        let mut buf = [0u8; 37];
        let read = handle.read(&mut buf).await.unwrap();
        assert_eq!(read, 37, "short read at offset {}", offset);
        assert_eq!(&buf[..], &data[offset..offset + 37]);
        assert_eq!(handle.position(), (offset + 37) as u64);
    }
}

#[tokio::test]
async fn sequential_reads_advance_the_cursor() {
    let data = pattern(100);
    let store = Arc::new(MockStore::new());
    store.put("seq.bin", data.clone());

    let mut handle = reader(&store, "seq.bin");
    let mut first = [0u8; 40];
    let mut second = [0u8; 60];
    assert_eq!(handle.read(&mut first).await.unwrap(), 40);
    assert_eq!(handle.read(&mut second).await.unwrap(), 60);
    assert_eq!(&first[..], &data[..40]);
    assert_eq!(&second[..], &data[40..]);
}

#[tokio::test]
async fn read_past_eof_returns_zero_and_keeps_the_cursor() {
    let store = Arc::new(MockStore::new());
    store.put("small.bin", pattern(10));

    let mut handle = reader(&store, "small.bin");
    handle.seek(100);
    let mut buf = [0u8; 8];
    assert_eq!(handle.read(&mut buf).await.unwrap(), 0);
    assert_eq!(handle.position(), 100);
}

#[tokio::test]
async fn seek_to_file_size_reads_zero() {
    let store = Arc::new(MockStore::new());
    store.put("edge.bin", pattern(64));

    let mut handle = reader(&store, "edge.bin");
    handle.seek(64);
    let mut buf = [0u8; 16];
    assert_eq!(handle.read(&mut buf).await.unwrap(), 0);
}

#[tokio::test]
async fn short_read_only_at_eof() {
    let store = Arc::new(MockStore::new());
    store.put("tail.bin", pattern(50));

    let mut handle = reader(&store, "tail.bin");
    handle.seek(40);
    let mut buf = [0u8; 32];
    assert_eq!(handle.read(&mut buf).await.unwrap(), 10);
}

#[tokio::test]
async fn reset_rewinds_to_start() {
    let data = pattern(30);
    let store = Arc::new(MockStore::new());
    store.put("r.bin", data.clone());

    let mut handle = reader(&store, "r.bin");
    let mut buf = [0u8; 30];
    handle.read(&mut buf).await.unwrap();
    assert_eq!(handle.position(), 30);

    handle.reset();
    assert_eq!(handle.position(), 0);
    let mut again = [0u8; 30];
    handle.read(&mut again).await.unwrap();
    assert_eq!(again, buf);
}

#[tokio::test]
async fn reading_a_missing_file_is_a_remote_io_error() {
    let store = Arc::new(MockStore::new());
    let mut handle = reader(&store, "missing.bin");
    let mut buf = [0u8; 4];
    assert!(matches!(
        handle.read(&mut buf).await,
        Err(SshVfsError::RemoteIo { .. })
    ));
}

#[tokio::test]
async fn read_on_write_handle_is_rejected() {
    let store = Arc::new(MockStore::new());
    let mut handle =
        SshFileHandle::new(store, "w.bin", OpenMode::Write, &SshVfsConfig::default());
    let mut buf = [0u8; 4];
    assert!(matches!(
        handle.read(&mut buf).await,
        Err(SshVfsError::Config(_))
    ));
    handle.close().await.unwrap();
}

#[tokio::test]
async fn file_size_reflects_the_store() {
    let store = Arc::new(MockStore::new());
    store.put("sized.bin", pattern(12345));
    let handle = reader(&store, "sized.bin");
    assert_eq!(handle.file_size().await, 12345);
}

#[tokio::test]
async fn file_size_falls_back_to_progress_mid_write() {
    // While an upload is assembling the destination the stat can fail; the
    // engine still gets a usable number.
    let store = Arc::new(MockStore::new());
    let config = SshVfsConfig::default();
    let mut handle = SshFileHandle::new(store, "inflight.bin", OpenMode::Write, &config);
    handle.write(&pattern(777)).await.unwrap();
    assert_eq!(handle.file_size().await, 777);
    handle.close().await.unwrap();
}
