use std::time::Duration;

use fedgate_state::{DistributedLock, LockGuard};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Lock name the health loop's leadership is tracked under, regardless of
/// backend. File-lock mode ignores it (one path, one lock); Redis mode uses
/// it as the key.
const LEADER_LOCK_NAME: &str = "federation-health-leader";

/// Leader Elector (C4), modeled as a thin consumer of the
/// [`DistributedLock`] capability (§9 "leader election variants as one
/// capability") rather than three bespoke code paths. The same `tick`
/// algorithm realizes all three backends:
///
/// - **Redis** (`try_acquire` once, `extend` every cycle): a held guard's
///   `extend` call refreshes the TTL; a held-by-another-instance lock makes
///   `try_acquire` return `None` every cycle until the TTL expires.
/// - **File lock** (§9 supplemented feature 3): `extend` is a no-op for a
///   file-lock guard (OS advisory locks have no TTL), so this process
///   simply keeps calling `try_acquire` every cycle until it succeeds.
/// - **None**: backed by an in-memory lock with no cross-process
///   contention, so the first `try_acquire` always succeeds and every
///   `extend` trivially succeeds — this process is always leader.
pub struct LeaderElector {
    lock: std::sync::Arc<dyn DistributedLock>,
    ttl: Duration,
    guard: Mutex<Option<Box<dyn LockGuard>>>,
}

impl LeaderElector {
    #[must_use]
    pub fn new(lock: std::sync::Arc<dyn DistributedLock>, ttl: Duration) -> Self {
        Self {
            lock,
            ttl,
            guard: Mutex::new(None),
        }
    }

    /// Attempt to (re)assert leadership for the current cycle. Returns
    /// whether this process is leader after the attempt.
    ///
    /// Failures to acquire/extend never propagate as an error (§7: "leader
    /// elector probe/refresh failures demote the instance to non-leader for
    /// the next cycle but do not crash the process") — they demote this
    /// instance to non-leader and are logged at warning level.
    pub async fn tick(&self) -> bool {
        let mut held = self.guard.lock().await;

        if let Some(guard) = held.as_ref() {
            match guard.extend(self.ttl).await {
                Ok(()) => return true,
                Err(e) => {
                    warn!(error = %e, "lost leadership: lock refresh failed");
                    *held = None;
                }
            }
        }

        match self.lock.try_acquire(LEADER_LOCK_NAME, self.ttl).await {
            Ok(Some(guard)) => {
                debug!("acquired leadership");
                *held = Some(guard);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "leader election attempt failed");
                false
            }
        }
    }

    /// Whether this process currently believes it holds leadership, without
    /// attempting to (re)acquire it.
    pub async fn is_leader(&self) -> bool {
        self.guard.lock().await.is_some()
    }

    /// Release leadership, if held. Called on shutdown.
    pub async fn release(&self) {
        let mut held = self.guard.lock().await;
        if let Some(guard) = held.take() {
            if let Err(e) = guard.release().await {
                warn!(error = %e, "failed to release leader lock on shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fedgate_state_memory::MemoryDistributedLock;

    use super::*;

    #[tokio::test]
    async fn single_instance_always_becomes_leader() {
        let elector = LeaderElector::new(Arc::new(MemoryDistributedLock::new()), Duration::from_secs(10));
        assert!(elector.tick().await);
        assert!(elector.tick().await, "second tick should extend, not re-contend");
    }

    #[tokio::test]
    async fn second_instance_is_not_leader_while_first_holds_lock() {
        let lock = Arc::new(MemoryDistributedLock::new());
        let a = LeaderElector::new(Arc::clone(&lock) as Arc<dyn DistributedLock>, Duration::from_secs(10));
        let b = LeaderElector::new(Arc::clone(&lock) as Arc<dyn DistributedLock>, Duration::from_secs(10));

        assert!(a.tick().await);
        assert!(!b.tick().await, "second elector should not win leadership");
    }

    #[tokio::test]
    async fn release_allows_another_instance_to_take_over() {
        let lock = Arc::new(MemoryDistributedLock::new());
        let a = LeaderElector::new(Arc::clone(&lock) as Arc<dyn DistributedLock>, Duration::from_secs(10));
        let b = LeaderElector::new(Arc::clone(&lock) as Arc<dyn DistributedLock>, Duration::from_secs(10));

        assert!(a.tick().await);
        a.release().await;
        assert!(b.tick().await, "leadership should be available after release");
    }
}
