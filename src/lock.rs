//! Advisory locks around fetch-diff-submit windows.
//!
//! A caller hands the reconciler either an exclusive-only lock or a
//! reader/writer lock ([`ZoneLock`]). Clients may additionally expose their
//! own exclusive lock through [`Client::locker`](crate::client::Client::locker).

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Proof of a held lock. Dropping it releases the lock.
pub struct LockGuard {
    _guard: Box<dyn Send>,
}

impl LockGuard {
    /// Wrap any guard value that releases its lock when dropped.
    pub fn new(guard: impl Send + 'static) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }

    /// Release the lock now.
    pub fn release(self) {}
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard").finish_non_exhaustive()
    }
}

/// Exclusive advisory lock.
#[async_trait]
pub trait Locker: Send + Sync {
    /// Wait for exclusive access.
    async fn lock(&self) -> LockGuard;
}

/// Lock with an additional shared mode.
#[async_trait]
pub trait SharedLocker: Locker {
    /// Wait for shared access.
    async fn read_lock(&self) -> LockGuard;
}

/// In-process exclusive lock.
#[derive(Debug, Clone, Default)]
pub struct ZoneMutex {
    inner: Arc<Mutex<()>>,
}

impl ZoneMutex {
    /// Create an unlocked mutex.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Locker for ZoneMutex {
    async fn lock(&self) -> LockGuard {
        LockGuard::new(self.inner.clone().lock_owned().await)
    }
}

/// In-process reader/writer lock.
#[derive(Debug, Clone, Default)]
pub struct ZoneRwLock {
    inner: Arc<RwLock<()>>,
}

impl ZoneRwLock {
    /// Create an unlocked reader/writer lock.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Locker for ZoneRwLock {
    async fn lock(&self) -> LockGuard {
        LockGuard::new(self.inner.clone().write_owned().await)
    }
}

#[async_trait]
impl SharedLocker for ZoneRwLock {
    async fn read_lock(&self) -> LockGuard {
        LockGuard::new(self.inner.clone().read_owned().await)
    }
}

/// Caller-supplied lock serializing reconciliation of one zone.
#[derive(Clone)]
pub enum ZoneLock {
    /// Exclusive only; verification reuses exclusive mode.
    Exclusive(Arc<dyn Locker>),
    /// Exclusive for writes, shared for verification and reads.
    ReadWrite(Arc<dyn SharedLocker>),
}

impl ZoneLock {
    /// Exclusive-only lock.
    pub fn exclusive(locker: impl Locker + 'static) -> Self {
        ZoneLock::Exclusive(Arc::new(locker))
    }

    /// Reader/writer lock.
    pub fn read_write(locker: impl SharedLocker + 'static) -> Self {
        ZoneLock::ReadWrite(Arc::new(locker))
    }

    /// Take the lock in exclusive mode.
    pub async fn lock(&self, cancel: &CancellationToken) -> Result<LockGuard> {
        match self {
            ZoneLock::Exclusive(locker) => acquire(locker.lock(), cancel).await,
            ZoneLock::ReadWrite(locker) => acquire(locker.lock(), cancel).await,
        }
    }

    /// Take the lock in shared mode when supported, exclusive otherwise.
    pub async fn read(&self, cancel: &CancellationToken) -> Result<LockGuard> {
        match self {
            ZoneLock::Exclusive(locker) => acquire(locker.lock(), cancel).await,
            ZoneLock::ReadWrite(locker) => acquire(locker.read_lock(), cancel).await,
        }
    }

    /// True when a shared mode is available.
    pub fn supports_shared(&self) -> bool {
        matches!(self, ZoneLock::ReadWrite(_))
    }
}

impl fmt::Debug for ZoneLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneLock::Exclusive(_) => f.write_str("ZoneLock::Exclusive"),
            ZoneLock::ReadWrite(_) => f.write_str("ZoneLock::ReadWrite"),
        }
    }
}

/// Wait for `guard`, giving up when `cancel` fires first.
pub async fn acquire<F>(guard: F, cancel: &CancellationToken) -> Result<LockGuard>
where
    F: std::future::Future<Output = LockGuard>,
{
    tokio::select! {
        biased;

        _ = cancel.cancelled() => Err(Error::Cancelled),
        guard = guard => Ok(guard),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_mutex_is_exclusive() {
        let lock = ZoneLock::exclusive(ZoneMutex::new());
        let cancel = CancellationToken::new();

        let held = lock.lock(&cancel).await.unwrap();
        let waiting = tokio::time::timeout(Duration::from_millis(20), lock.read(&cancel)).await;
        assert!(waiting.is_err(), "exclusive lock must not grant shared access");

        held.release();
        assert!(lock.read(&cancel).await.is_ok());
    }

    #[tokio::test]
    async fn test_rwlock_allows_concurrent_readers() {
        let lock = ZoneLock::read_write(ZoneRwLock::new());
        let cancel = CancellationToken::new();

        assert!(lock.supports_shared());
        let _first = lock.read(&cancel).await.unwrap();
        let second = tokio::time::timeout(Duration::from_millis(20), lock.read(&cancel)).await;
        assert!(second.is_ok());

        let writer = tokio::time::timeout(Duration::from_millis(20), lock.lock(&cancel)).await;
        assert!(writer.is_err(), "writer must wait for readers");
    }

    #[tokio::test]
    async fn test_cancelled_while_waiting() {
        let lock = ZoneLock::exclusive(ZoneMutex::new());
        let cancel = CancellationToken::new();
        let _held = lock.lock(&cancel).await.unwrap();

        let waiter = {
            let lock = lock.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { lock.lock(&cancel).await })
        };

        cancel.cancel();
        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
