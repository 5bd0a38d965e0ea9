//! Trait abstractions for the federation service's persistence and
//! coordination boundaries.
//!
//! This crate defines contracts only — [`GatewayRepository`] for gateway
//! and tool storage, [`DistributedLock`] for leader election — so that the
//! federation crate stays backend-agnostic. See `fedgate-state-memory`,
//! `fedgate-state-redis`, and `fedgate-state-filelock` for implementations.

mod error;
mod lock;
mod repository;

pub mod testing;

pub use error::StateError;
pub use lock::{DistributedLock, LockGuard};
pub use repository::{GatewayRepository, ToolStatusSink};
