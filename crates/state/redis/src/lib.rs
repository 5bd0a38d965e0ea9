//! Redis-backed [`DistributedLock`](fedgate_state::DistributedLock),
//! implementing the federation's "distributed-KV mode" leader election (C4).

mod config;
mod lock;
mod scripts;

pub use config::RedisConfig;
pub use lock::{RedisDistributedLock, RedisLockGuard};
