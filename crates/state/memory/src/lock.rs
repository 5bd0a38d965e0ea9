use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use uuid::Uuid;

use fedgate_state::{DistributedLock, LockGuard, StateError};

/// Internal entry representing a held lock.
#[derive(Debug, Clone)]
struct LockEntry {
    owner: String,
    expires_at: Instant,
}

impl LockEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory [`DistributedLock`] backed by a [`DashMap`].
///
/// Implements the spec's "none mode" degenerate deployment and backs the
/// repository conformance tests. Lock expiry is lazy: an expired entry is
/// evicted on the next acquire attempt for the same lock name.
#[derive(Debug, Clone, Default)]
pub struct MemoryDistributedLock {
    locks: Arc<DashMap<String, LockEntry>>,
}

impl MemoryDistributedLock {
    /// Create a new in-memory distributed lock manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DistributedLock for MemoryDistributedLock {
    async fn try_acquire(
        &self,
        name: &str,
        ttl: Duration,
    ) -> Result<Option<Box<dyn LockGuard>>, StateError> {
        let key = name.to_owned();

        self.locks.remove_if(&key, |_, entry| entry.is_expired());

        let owner = Uuid::new_v4().to_string();
        match self.locks.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(None),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(LockEntry {
                    owner: owner.clone(),
                    expires_at: Instant::now() + ttl,
                });
                Ok(Some(Box::new(MemoryLockGuard {
                    locks: Arc::clone(&self.locks),
                    name: key,
                    owner,
                })))
            }
        }
    }

    async fn acquire(
        &self,
        name: &str,
        ttl: Duration,
        timeout: Duration,
    ) -> Result<Box<dyn LockGuard>, StateError> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(guard) = self.try_acquire(name, ttl).await? {
                return Ok(guard);
            }

            if Instant::now() >= deadline {
                return Err(StateError::Timeout(timeout));
            }

            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

/// Guard for a lock acquired via [`MemoryDistributedLock`].
#[derive(Debug)]
pub struct MemoryLockGuard {
    locks: Arc<DashMap<String, LockEntry>>,
    name: String,
    owner: String,
}

#[async_trait]
impl LockGuard for MemoryLockGuard {
    async fn extend(&self, duration: Duration) -> Result<(), StateError> {
        let mut entry = self
            .locks
            .get_mut(&self.name)
            .ok_or_else(|| StateError::LockExpired(self.name.clone()))?;

        if entry.owner != self.owner || entry.is_expired() {
            return Err(StateError::LockExpired(self.name.clone()));
        }

        entry.expires_at = Instant::now() + duration;
        Ok(())
    }

    async fn release(self: Box<Self>) -> Result<(), StateError> {
        self.locks
            .remove_if(&self.name, |_, entry| entry.owner == self.owner);
        Ok(())
    }

    async fn is_held(&self) -> Result<bool, StateError> {
        match self.locks.get(&self.name) {
            Some(entry) => Ok(entry.owner == self.owner && !entry.is_expired()),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use fedgate_state::testing::run_lock_conformance_tests;

    use super::*;

    #[tokio::test]
    async fn conformance() {
        let lock = MemoryDistributedLock::new();
        run_lock_conformance_tests(&lock)
            .await
            .expect("lock conformance tests should pass");
    }

    #[tokio::test(start_paused = true)]
    async fn lock_expires_after_ttl() {
        let lock = MemoryDistributedLock::new();

        let guard = lock
            .try_acquire("expire-lock", Duration::from_secs(2))
            .await
            .unwrap()
            .expect("should acquire");

        assert!(guard.is_held().await.unwrap());

        tokio::time::advance(Duration::from_secs(3)).await;

        assert!(!guard.is_held().await.unwrap());

        let guard2 = lock
            .try_acquire("expire-lock", Duration::from_secs(10))
            .await
            .unwrap();
        assert!(guard2.is_some(), "should acquire after TTL expiry");
    }

    #[tokio::test]
    async fn concurrent_lock_contention() {
        let lock = Arc::new(MemoryDistributedLock::new());
        let counter = Arc::new(std::sync::atomic::AtomicU32::new(0));

        let mut handles = Vec::new();

        for _ in 0..10 {
            let lock = Arc::clone(&lock);
            let counter = Arc::clone(&counter);
            handles.push(tokio::spawn(async move {
                let guard = lock
                    .acquire(
                        "contention-lock",
                        Duration::from_millis(200),
                        Duration::from_secs(5),
                    )
                    .await
                    .expect("should eventually acquire");

                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

                guard.release().await.expect("release should succeed");
            }));
        }

        for h in handles {
            h.await.expect("task should not panic");
        }

        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 10);
    }
}
