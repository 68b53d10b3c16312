//! In-memory remote store for exercising the write pipeline and read path
//! without a live server.

#![allow(dead_code)]

use sshvfs_platform::{RemoteFileStore, RemoteMetadata, SshVfsError, SshVfsResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One observed `upload_chunk` call, in wire order.
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub append: bool,
    pub bytes: usize,
}

/// Mock store backing file contents with a map.
#[derive(Default)]
pub struct MockStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    uploads: Mutex<Vec<UploadRecord>>,
    fail_upload_index: Option<usize>,
    upload_counter: AtomicUsize,
    upload_delay: Option<Duration>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the n-th `upload_chunk` call (0-based) with a remote I/O error.
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_upload_index: Some(index),
            ..Self::default()
        }
    }

    /// Sleeps inside every upload so chunk production overlaps transfer.
    pub fn with_upload_delay(delay: Duration) -> Self {
        Self {
            upload_delay: Some(delay),
            ..Self::default()
        }
    }

    /// Seeds a file, for read tests.
    pub fn put(&self, path: &str, data: Vec<u8>) {
        self.files.lock().unwrap().insert(path.to_string(), data);
    }

    /// Full contents of a file, if it exists.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    /// Every `upload_chunk` call observed so far, in order.
    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RemoteFileStore for MockStore {
    async fn upload_chunk(&self, path: &str, data: &[u8], append: bool) -> SshVfsResult<()> {
        let index = self.upload_counter.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.upload_delay {
            tokio::time::sleep(delay).await;
        }
        self.uploads.lock().unwrap().push(UploadRecord {
            append,
            bytes: data.len(),
        });

        if self.fail_upload_index == Some(index) {
            return Err(SshVfsError::RemoteIo {
                path: path.to_string(),
                message: "write failed: injected failure (status 4)".to_string(),
            });
        }

        let mut files = self.files.lock().unwrap();
        if append {
            let file = files.get_mut(path).ok_or_else(|| SshVfsError::RemoteIo {
                path: path.to_string(),
                message: "append to a file that was never created".to_string(),
            })?;
            file.extend_from_slice(data);
        } else {
            files.insert(path.to_string(), data.to_vec());
        }
        Ok(())
    }

    async fn read_bytes(&self, path: &str, offset: u64, buf: &mut [u8]) -> SshVfsResult<usize> {
        let files = self.files.lock().unwrap();
        let file = files.get(path).ok_or_else(|| SshVfsError::RemoteIo {
            path: path.to_string(),
            message: "open for read failed: no such file".to_string(),
        })?;
        let offset = offset as usize;
        if offset >= file.len() {
            return Ok(0);
        }
        let n = buf.len().min(file.len() - offset);
        buf[..n].copy_from_slice(&file[offset..offset + n]);
        Ok(n)
    }

    async fn stat(&self, path: &str) -> SshVfsResult<RemoteMetadata> {
        let files = self.files.lock().unwrap();
        let file = files.get(path).ok_or_else(|| SshVfsError::RemoteIo {
            path: path.to_string(),
            message: "stat failed: no such file".to_string(),
        })?;
        Ok(RemoteMetadata {
            size: Some(file.len() as u64),
            modified_unix_secs: None,
            is_dir: false,
        })
    }

    async fn truncate(&self, path: &str, size: u64) -> SshVfsResult<()> {
        let mut files = self.files.lock().unwrap();
        let file = files.get_mut(path).ok_or_else(|| SshVfsError::RemoteIo {
            path: path.to_string(),
            message: "truncate failed: no such file".to_string(),
        })?;
        file.resize(size as usize, 0);
        Ok(())
    }
}

/// The byte pattern used across scenarios: `b[i] = i mod 251`.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
