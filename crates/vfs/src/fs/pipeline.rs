//! Streaming upload pipeline.
//!
//! The producer appends into an accumulating buffer owned by the file handle;
//! sealed chunks enter this pipeline, which runs at most *W* uploader tasks
//! at a time and assembles the destination file in place: part 0 opens the
//! file with create-and-truncate semantics, every later part appends. The
//! server therefore observes upload calls in strictly increasing part order,
//! which an ordered turnstile enforces — the uploader for part *n* takes its
//! turn only after part *n-1* has committed.
//!
//! The first uploader to fail wins the error slot; uploaders behind it tear
//! down without writing so no bytes land after a gap. The producer sees the
//! error on its next dispatch, or at the latest when it drains the pipeline.

use bytes::Bytes;
use sshvfs_platform::{RemoteFileStore, SshVfsError, SshVfsResult};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::{debug, warn};

/// One not-yet-uploaded chunk.
pub(crate) struct WriteBuffer {
    /// Monotone part index; part 0 truncates, later parts append.
    pub part_no: usize,
    /// Sealed payload.
    pub data: Bytes,
    /// Taken by exactly one uploader task.
    pub uploading: AtomicBool,
    /// Set once the chunk is committed on the server.
    pub uploaded: AtomicBool,
}

/// State shared between the producer and its uploader tasks.
struct UploadState {
    in_flight: AtomicUsize,
    chunks_uploaded: AtomicUsize,
    bytes_uploaded: AtomicU64,
    /// Part index whose turn it is to touch the wire.
    next_part: AtomicUsize,
    has_error: AtomicBool,
    /// Won by the first failing uploader; later failures are dropped.
    error_claimed: AtomicBool,
    first_error: Mutex<Option<SshVfsError>>,
    active: Mutex<Vec<Arc<WriteBuffer>>>,
    /// Signalled whenever an uploader finishes, successfully or not.
    upload_done: Notify,
    /// Signalled whenever `next_part` advances.
    turn: Notify,
}

/// Bounded, ordered chunk uploader for one open file.
pub(crate) struct UploadPipeline {
    store: Arc<dyn RemoteFileStore>,
    path: String,
    width: usize,
    parts_emitted: usize,
    state: Arc<UploadState>,
}

impl UploadPipeline {
    pub fn new(store: Arc<dyn RemoteFileStore>, path: String, width: usize) -> Self {
        Self {
            store,
            path,
            width: width.max(1),
            parts_emitted: 0,
            state: Arc::new(UploadState {
                in_flight: AtomicUsize::new(0),
                chunks_uploaded: AtomicUsize::new(0),
                bytes_uploaded: AtomicU64::new(0),
                next_part: AtomicUsize::new(0),
                has_error: AtomicBool::new(false),
                error_claimed: AtomicBool::new(false),
                first_error: Mutex::new(None),
                active: Mutex::new(Vec::new()),
                upload_done: Notify::new(),
                turn: Notify::new(),
            }),
        }
    }

    /// Hands a sealed chunk to an uploader task.
    ///
    /// Blocks while `width` uploads are already in flight — the sole
    /// producer-side backpressure — and re-checks the error flag on every
    /// wake-up before dispatching.
    pub async fn dispatch(&mut self, data: Bytes) -> SshVfsResult<()> {
        loop {
            let notified = self.state.upload_done.notified();
            if self.state.has_error.load(Ordering::Acquire)
                || self.state.in_flight.load(Ordering::Acquire) < self.width
            {
                break;
            }
            notified.await;
        }
        self.raise_pending()?;

        let buffer = Arc::new(WriteBuffer {
            part_no: self.parts_emitted,
            data,
            uploading: AtomicBool::new(false),
            uploaded: AtomicBool::new(false),
        });
        self.parts_emitted += 1;

        debug!(
            path = %self.path,
            part = buffer.part_no,
            bytes = buffer.data.len(),
            "dispatching chunk"
        );
        lock_unpoisoned(&self.state.active).push(Arc::clone(&buffer));
        self.state.in_flight.fetch_add(1, Ordering::AcqRel);

        let store = Arc::clone(&self.store);
        let path = self.path.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(run_upload(store, path, state, buffer));
        Ok(())
    }

    /// Waits until every dispatched uploader has completed or reported
    /// failure, then raises any captured first error.
    pub async fn finish(&mut self) -> SshVfsResult<()> {
        loop {
            let notified = self.state.upload_done.notified();
            if self.state.in_flight.load(Ordering::Acquire) == 0 {
                break;
            }
            notified.await;
        }
        self.raise_pending()
    }

    /// Raises the captured first error, if any.
    pub fn raise_pending(&self) -> SshVfsResult<()> {
        if !self.state.has_error.load(Ordering::Acquire) {
            return Ok(());
        }
        match lock_unpoisoned(&self.state.first_error).take() {
            Some(error) => Err(error),
            // Already raised once; keep failing rather than pretending the
            // handle recovered.
            None => Err(SshVfsError::Upload {
                path: self.path.clone(),
                part: self.state.next_part.load(Ordering::Acquire),
                message: "an earlier chunk upload failed".to_string(),
            }),
        }
    }

    pub fn chunks_emitted(&self) -> usize {
        self.parts_emitted
    }

    pub fn chunks_uploaded(&self) -> usize {
        self.state.chunks_uploaded.load(Ordering::Acquire)
    }

    pub fn bytes_uploaded(&self) -> u64 {
        self.state.bytes_uploaded.load(Ordering::Acquire)
    }

    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::Acquire)
    }
}

async fn run_upload(
    store: Arc<dyn RemoteFileStore>,
    path: String,
    state: Arc<UploadState>,
    buffer: Arc<WriteBuffer>,
) {
    if buffer
        .uploading
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        // Already claimed by another task.
        return;
    }

    // Wait for our turn so appends land in part order.
    loop {
        let notified = state.turn.notified();
        if state.next_part.load(Ordering::Acquire) == buffer.part_no {
            break;
        }
        notified.await;
    }

    // After a failure the file has a hole at the failed part; writing past
    // it would corrupt the destination, so later parts only tear down.
    let outcome = if state.has_error.load(Ordering::Acquire) {
        None
    } else {
        Some(
            store
                .upload_chunk(&path, &buffer.data, buffer.part_no > 0)
                .await,
        )
    };

    match outcome {
        Some(Ok(())) => {
            buffer.uploaded.store(true, Ordering::Release);
            state.chunks_uploaded.fetch_add(1, Ordering::AcqRel);
            state
                .bytes_uploaded
                .fetch_add(buffer.data.len() as u64, Ordering::AcqRel);
            debug!(path = %path, part = buffer.part_no, bytes = buffer.data.len(), "chunk committed");
        }
        Some(Err(error)) => {
            warn!(path = %path, part = buffer.part_no, error = %error, "chunk upload failed");
            let error = attach_part(&path, buffer.part_no, error);
            if !state.error_claimed.swap(true, Ordering::AcqRel) {
                *lock_unpoisoned(&state.first_error) = Some(error);
            }
            // Raised only after the slot is populated, and before the
            // turnstile opens: whoever observes the flag finds the error,
            // and the next part sees it in time to skip its write.
            state.has_error.store(true, Ordering::Release);
        }
        None => {
            debug!(path = %path, part = buffer.part_no, "chunk skipped after earlier failure");
        }
    }

    state.next_part.fetch_add(1, Ordering::AcqRel);
    state.turn.notify_waiters();

    // Committed buffers leave the active list; a failed buffer stays so the
    // handle still owns the unwritten payload.
    lock_unpoisoned(&state.active).retain(|b| !b.uploaded.load(Ordering::Acquire));
    state.in_flight.fetch_sub(1, Ordering::AcqRel);
    state.upload_done.notify_waiters();
}

/// Folds the part index into the captured error without changing its kind:
/// a remote I/O failure stays remote I/O, only its message names the part.
fn attach_part(path: &str, part: usize, error: SshVfsError) -> SshVfsError {
    match error {
        SshVfsError::RemoteIo {
            path: error_path,
            message,
        } => SshVfsError::RemoteIo {
            path: error_path,
            message: format!("part {}: {}", part, message),
        },
        SshVfsError::StalledWrite { .. } => error,
        other => SshVfsError::Upload {
            path: path.to_string(),
            part,
            message: other.to_string(),
        },
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
