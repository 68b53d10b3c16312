//! Per-open-file state.

use crate::fs::pipeline::UploadPipeline;
use crate::ssh::params::SshVfsConfig;
use bytes::BytesMut;
use sshvfs_platform::{RemoteFileStore, SshVfsError, SshVfsResult};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// How a file handle is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Byte-range reads through a position cursor.
    Read,
    /// Streaming append-mode upload; the destination is replaced.
    Write,
}

/// An open remote file.
///
/// A write handle accumulates bytes into a chunk-sized buffer and streams
/// sealed chunks through a bounded upload pipeline while the producer keeps
/// writing; [`close`](SshFileHandle::close) drains the pipeline and raises
/// the first captured error. A read handle keeps a byte-position cursor and
/// issues position-addressed reads.
///
/// Handles are not safe for concurrent use from multiple tasks; all methods
/// take `&mut self` and the engine drives a handle from one thread.
pub struct SshFileHandle {
    path: String,
    store: Arc<dyn RemoteFileStore>,
    mode: OpenMode,
    position: u64,
    buffer: BytesMut,
    chunk_size: usize,
    bytes_produced: u64,
    pipeline: Option<UploadPipeline>,
    closed: bool,
}

impl SshFileHandle {
    /// Creates a handle over any remote store.
    pub fn new(
        store: Arc<dyn RemoteFileStore>,
        path: impl Into<String>,
        mode: OpenMode,
        config: &SshVfsConfig,
    ) -> Self {
        let path = path.into();
        let pipeline = match mode {
            OpenMode::Write => Some(UploadPipeline::new(
                Arc::clone(&store),
                path.clone(),
                config.max_concurrent_uploads,
            )),
            OpenMode::Read => None,
        };
        debug!(path = %path, ?mode, "file handle created");
        Self {
            buffer: BytesMut::with_capacity(match mode {
                OpenMode::Write => config.chunk_size,
                OpenMode::Read => 0,
            }),
            chunk_size: config.chunk_size,
            path,
            store,
            mode,
            position: 0,
            bytes_produced: 0,
            pipeline,
            closed: false,
        }
    }

    /// Remote path this handle addresses.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The mode this handle was opened with.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Appends bytes to the upload stream.
    ///
    /// Whenever the accumulating buffer reaches the chunk size it is sealed
    /// under the next part index and dispatched; dispatch blocks while the
    /// configured number of uploads is already in flight. An upload failure
    /// from an earlier chunk surfaces here on the next call.
    pub async fn write(&mut self, mut data: &[u8]) -> SshVfsResult<()> {
        self.ensure_open()?;
        let Some(pipeline) = self.pipeline.as_mut() else {
            return Err(SshVfsError::Config(format!(
                "'{}' is not opened for writing",
                self.path
            )));
        };
        pipeline.raise_pending()?;

        self.bytes_produced += data.len() as u64;
        while !data.is_empty() {
            let space_left = self.chunk_size - self.buffer.len();
            let take = space_left.min(data.len());
            self.buffer.extend_from_slice(&data[..take]);
            data = &data[take..];

            if self.buffer.len() >= self.chunk_size {
                let sealed = self.buffer.split().freeze();
                pipeline.dispatch(sealed).await?;
                self.buffer.reserve(self.chunk_size);
            }
        }
        Ok(())
    }

    /// Dispatches the accumulating buffer even when it is short.
    pub async fn flush(&mut self) -> SshVfsResult<()> {
        self.ensure_open()?;
        let Some(pipeline) = self.pipeline.as_mut() else {
            return Ok(());
        };
        pipeline.raise_pending()?;
        if !self.buffer.is_empty() {
            let sealed = self.buffer.split().freeze();
            pipeline.dispatch(sealed).await?;
            self.buffer.reserve(self.chunk_size);
        }
        Ok(())
    }

    /// Flushes, waits until every dispatched uploader has finished, and
    /// raises any captured first error. Idempotent.
    pub async fn close(&mut self) -> SshVfsResult<()> {
        if self.closed {
            return Ok(());
        }
        if self.pipeline.is_some() {
            self.flush().await?;
        }
        if let Some(pipeline) = self.pipeline.as_mut() {
            pipeline.finish().await?;
        }
        self.closed = true;
        debug!(path = %self.path, "file handle closed");
        Ok(())
    }

    /// Reads up to `buf.len()` bytes at the cursor, advancing it by the
    /// amount read. Returns 0 only at end-of-file; a short read never occurs
    /// elsewhere.
    pub async fn read(&mut self, buf: &mut [u8]) -> SshVfsResult<usize> {
        self.ensure_open()?;
        if self.mode != OpenMode::Read {
            return Err(SshVfsError::Config(format!(
                "'{}' is not opened for reading",
                self.path
            )));
        }
        let read = self.store.read_bytes(&self.path, self.position, buf).await?;
        self.position += read as u64;
        Ok(read)
    }

    /// Moves the cursor to an absolute position.
    pub fn seek(&mut self, position: u64) {
        self.position = position;
    }

    /// Moves the cursor back to the start.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Current cursor position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Truncates (or extends) the remote file to `size` bytes, flushing any
    /// buffered writes first.
    pub async fn truncate(&mut self, size: u64) -> SshVfsResult<()> {
        if self.pipeline.is_some() {
            self.flush().await?;
        }
        if let Some(pipeline) = self.pipeline.as_mut() {
            pipeline.finish().await?;
        }
        self.store.truncate(&self.path, size).await
    }

    /// Bytes committed to the server plus bytes still in the accumulating
    /// buffer; the engine renders this as upload progress.
    pub fn progress(&self) -> u64 {
        let uploaded = self
            .pipeline
            .as_ref()
            .map(|p| p.bytes_uploaded())
            .unwrap_or(0);
        uploaded + self.buffer.len() as u64
    }

    /// Size of the remote file. While an upload is still assembling the file
    /// the stat may fail or lag; progress stands in then.
    pub async fn file_size(&self) -> u64 {
        match self.store.stat(&self.path).await {
            Ok(metadata) => metadata.size.unwrap_or(0),
            Err(_) => self.progress(),
        }
    }

    /// Last modification time, when the server reports one.
    pub async fn last_modified(&self) -> SystemTime {
        match self.store.stat(&self.path).await {
            Ok(metadata) => metadata
                .modified_unix_secs
                .map(|secs| UNIX_EPOCH + Duration::from_secs(secs))
                .unwrap_or_else(SystemTime::now),
            Err(_) => SystemTime::now(),
        }
    }

    /// Bytes accepted from the producer so far.
    pub fn bytes_produced(&self) -> u64 {
        self.bytes_produced
    }

    /// Chunks sealed and handed to the pipeline so far.
    pub fn chunks_emitted(&self) -> usize {
        self.pipeline.as_ref().map(|p| p.chunks_emitted()).unwrap_or(0)
    }

    /// Chunks committed on the server so far.
    pub fn chunks_uploaded(&self) -> usize {
        self.pipeline
            .as_ref()
            .map(|p| p.chunks_uploaded())
            .unwrap_or(0)
    }

    /// Bytes committed on the server so far.
    pub fn bytes_uploaded(&self) -> u64 {
        self.pipeline.as_ref().map(|p| p.bytes_uploaded()).unwrap_or(0)
    }

    fn ensure_open(&self) -> SshVfsResult<()> {
        if self.closed {
            return Err(SshVfsError::Config(format!(
                "'{}' is already closed",
                self.path
            )));
        }
        Ok(())
    }
}

impl Drop for SshFileHandle {
    fn drop(&mut self) {
        if !self.closed {
            let pending = self
                .pipeline
                .as_ref()
                .map(|p| p.in_flight() > 0)
                .unwrap_or(false);
            if pending || !self.buffer.is_empty() {
                warn!(
                    path = %self.path,
                    buffered = self.buffer.len(),
                    "write handle dropped without close(), destination is incomplete"
                );
            }
        }
    }
}
