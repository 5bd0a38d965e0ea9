//! OS advisory-lock-backed [`DistributedLock`], implementing the spec's
//! "file-lock mode" leader election (C4) for single-host deployments with
//! multiple worker processes sharing a filesystem.
//!
//! Unlike the Redis backend, a file lock has no notion of a lock *name* —
//! one [`FileDistributedLock`] is bound to a single configured path at
//! construction time (the spec's `filelock_path` option names exactly one
//! file). `try_acquire`'s `name` argument is accepted for trait conformance
//! but ignored; every call locks the same underlying file.
//!
//! There is also no TTL at the OS level: the lock is held until released or
//! until the holding process exits, at which point the kernel releases it
//! automatically. `ttl` is accepted for trait conformance and otherwise
//! unused — the health loop's retry cadence (§9, supplemented feature 3)
//! is what bounds how long a waiting process goes before trying again.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fs4::FileExt;

use fedgate_state::{DistributedLock, LockGuard, StateError};

/// File-lock-backed [`DistributedLock`] bound to a single path.
#[derive(Debug, Clone)]
pub struct FileDistributedLock {
    path: Arc<PathBuf>,
}

impl FileDistributedLock {
    /// Bind to the advisory lock file at `path`, creating it if absent.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    fn open(path: &Path) -> io::Result<File> {
        OpenOptions::new().create(true).write(true).open(path)
    }
}

#[async_trait]
impl DistributedLock for FileDistributedLock {
    async fn try_acquire(
        &self,
        _name: &str,
        _ttl: Duration,
    ) -> Result<Option<Box<dyn LockGuard>>, StateError> {
        let path = Arc::clone(&self.path);
        let acquired = tokio::task::spawn_blocking(move || -> io::Result<Option<File>> {
            let file = Self::open(&path)?;
            match file.try_lock_exclusive() {
                Ok(()) => Ok(Some(file)),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(|e| StateError::Backend(e.to_string()))?
        .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(acquired.map(|file| Box::new(FileLockGuard { file: Some(file) }) as Box<dyn LockGuard>))
    }

    async fn acquire(
        &self,
        name: &str,
        ttl: Duration,
        timeout: Duration,
    ) -> Result<Box<dyn LockGuard>, StateError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let Some(guard) = self.try_acquire(name, ttl).await? {
                return Ok(guard);
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(StateError::Timeout(timeout));
            }

            let remaining = deadline - tokio::time::Instant::now();
            tokio::time::sleep(Duration::from_millis(50).min(remaining)).await;
        }
    }
}

/// A held file-system advisory lock.
///
/// Dropping without [`release`](LockGuard::release) is safe: the OS releases
/// the lock when the file descriptor closes, including on process crash.
pub struct FileLockGuard {
    file: Option<File>,
}

#[async_trait]
impl LockGuard for FileLockGuard {
    /// No-op: OS advisory locks have no TTL to refresh. The caller's retry
    /// cadence (not a TTL) is what bounds leadership windows in file-lock
    /// mode.
    async fn extend(&self, _duration: Duration) -> Result<(), StateError> {
        Ok(())
    }

    async fn release(mut self: Box<Self>) -> Result<(), StateError> {
        if let Some(file) = self.file.take() {
            tokio::task::spawn_blocking(move || FileExt::unlock(&file))
                .await
                .map_err(|e| StateError::Backend(e.to_string()))?
                .map_err(|e| StateError::Backend(e.to_string()))?;
        }
        Ok(())
    }

    async fn is_held(&self) -> Result<bool, StateError> {
        Ok(self.file.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn conformance() {
        let dir = tempfile_dir();
        let lock = FileDistributedLock::new(dir.join("leader.lock"));
        fedgate_state::testing::run_lock_conformance_tests(&lock)
            .await
            .expect("lock conformance tests should pass");
    }

    #[tokio::test]
    async fn second_process_cannot_acquire_while_held() {
        let dir = tempfile_dir();
        let path = dir.join("leader.lock");
        let lock_a = FileDistributedLock::new(&path);
        let lock_b = FileDistributedLock::new(&path);

        let guard = lock_a
            .try_acquire("leader", Duration::from_secs(10))
            .await
            .unwrap()
            .expect("first acquire should succeed");

        let second = lock_b
            .try_acquire("leader", Duration::from_secs(10))
            .await
            .unwrap();
        assert!(second.is_none(), "second process should not acquire");

        guard.release().await.unwrap();

        let third = lock_b
            .try_acquire("leader", Duration::from_secs(10))
            .await
            .unwrap();
        assert!(third.is_some(), "lock should be free after release");
    }

    fn tempfile_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fedgate-filelock-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
