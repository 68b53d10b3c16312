//! Bounded pool of reusable SFTP sessions.
//!
//! SFTP sessions over an established SSH connection are expensive to create
//! and some servers cap how many may exist at once, so each transport keeps a
//! small fixed set and lends them out one borrower at a time. Borrowing waits
//! until a session is idle; returning wakes one waiter.

use sshvfs_platform::{SshVfsError, SshVfsResult};
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::sync::Mutex;
use tokio::sync::Notify;
use tracing::debug;

/// A bounded pool of reusable sessions.
///
/// Generic over the session type; the transport instantiates it with the SFTP
/// session of the SSH library. Invariants:
///
/// - `idle + borrowed <= capacity`, and a session is never in both states
/// - initialisation is lazy on the first borrow; a failure tears down any
///   partially created sessions (dropping a session closes it) and surfaces
///   the error, leaving the pool uninitialised for the next attempt
/// - every borrow is released through the guard, on every path
pub struct SessionPool<S> {
    capacity: usize,
    state: Mutex<PoolState<S>>,
    available: Notify,
    init: tokio::sync::OnceCell<()>,
}

struct PoolState<S> {
    idle: Vec<S>,
    borrowed: usize,
}

/// RAII guard for a borrowed session. Returns the session to the pool on
/// drop, which also wakes one blocked borrower.
pub struct PooledSession<'a, S> {
    session: Option<S>,
    pool: &'a SessionPool<S>,
}

impl<S> SessionPool<S> {
    /// Creates an empty pool. Sessions are created on first borrow.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                borrowed: 0,
            }),
            available: Notify::new(),
            init: tokio::sync::OnceCell::new(),
        }
    }

    /// Borrows a session, waiting until one is idle.
    ///
    /// On the first borrow the pool fills itself by calling `open` once per
    /// slot, sequentially against the parent connection.
    pub async fn borrow<F, Fut>(&self, open: F) -> SshVfsResult<PooledSession<'_, S>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = SshVfsResult<S>>,
    {
        self.init
            .get_or_try_init(|| async {
                debug!(capacity = self.capacity, "initializing session pool");
                let mut created = Vec::with_capacity(self.capacity);
                for _ in 0..self.capacity {
                    created.push(open().await?);
                }
                let mut state = self.lock_state();
                state.idle = created;
                Ok::<(), SshVfsError>(())
            })
            .await?;

        loop {
            let notified = self.available.notified();
            {
                let mut state = self.lock_state();
                if let Some(session) = state.idle.pop() {
                    state.borrowed += 1;
                    return Ok(PooledSession {
                        session: Some(session),
                        pool: self,
                    });
                }
            }
            debug!("session pool empty, waiting for a return");
            notified.await;
        }
    }

    /// Removes every idle session so the caller can shut them down before the
    /// parent connection goes away. The pool is not usable afterwards.
    pub fn drain(&self) -> Vec<S> {
        let mut state = self.lock_state();
        std::mem::take(&mut state.idle)
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sessions currently idle in the pool.
    pub fn idle_count(&self) -> usize {
        self.lock_state().idle.len()
    }

    /// Sessions currently lent out.
    pub fn borrowed_count(&self) -> usize {
        self.lock_state().borrowed
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, PoolState<S>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn put_back(&self, session: S) {
        let mut state = self.lock_state();
        state.idle.push(session);
        state.borrowed = state.borrowed.saturating_sub(1);
        drop(state);
        self.available.notify_one();
    }
}

impl<S> Deref for PooledSession<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.session.as_ref().expect("session taken before drop")
    }
}

impl<S> DerefMut for PooledSession<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.session.as_mut().expect("session taken before drop")
    }
}

impl<S> Drop for PooledSession<'_, S> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.pool.put_back(session);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sshvfs_platform::SshVfsError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_lazy_initialization_fills_pool() {
        let pool: SessionPool<u32> = SessionPool::new(3);
        assert_eq!(pool.idle_count(), 0);

        let counter = AtomicU32::new(0);
        let guard = pool
            .borrow(|| async { Ok(counter.fetch_add(1, Ordering::SeqCst)) })
            .await
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(pool.idle_count(), 2);
        assert_eq!(pool.borrowed_count(), 1);
        drop(guard);
        assert_eq!(pool.idle_count(), 3);
        assert_eq!(pool.borrowed_count(), 0);
    }

    #[tokio::test]
    async fn test_accounting_never_exceeds_capacity() {
        let pool: SessionPool<u32> = SessionPool::new(2);
        let make = || async { Ok(0u32) };

        let first = pool.borrow(make).await.unwrap();
        let second = pool.borrow(make).await.unwrap();
        assert_eq!(pool.idle_count() + pool.borrowed_count(), 2);
        drop(first);
        drop(second);
        assert_eq!(pool.idle_count(), 2);
    }

    #[tokio::test]
    async fn test_borrow_blocks_until_return() {
        let pool = std::sync::Arc::new(SessionPool::<u32>::new(1));
        let guard = pool.borrow(|| async { Ok(7u32) }).await.unwrap();

        let pool2 = pool.clone();
        let waiter = tokio::spawn(async move {
            let g = pool2.borrow(|| async { Ok(0u32) }).await.unwrap();
            *g
        });

        // The waiter cannot make progress while the only session is out.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        let value = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_failed_initialization_surfaces_and_retries() {
        let pool: SessionPool<u32> = SessionPool::new(2);
        let calls = AtomicU32::new(0);

        let result = pool
            .borrow(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(1u32)
                } else {
                    Err(SshVfsError::Config("sftp init failed".to_string()))
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(pool.idle_count(), 0);

        // The pool stayed uninitialised; the next borrow starts over.
        let guard = pool.borrow(|| async { Ok(9u32) }).await.unwrap();
        assert_eq!(*guard, 9);
    }
}
