//! In-memory [`GatewayRepository`](fedgate_state::GatewayRepository) and
//! [`DistributedLock`](fedgate_state::DistributedLock) backend.
//!
//! Backs the federation crate's test suite and the spec's "none mode"
//! degenerate single-process deployment, where there is nothing to
//! federate across processes in the first place.

mod lock;
mod repository;

pub use lock::{MemoryDistributedLock, MemoryLockGuard};
pub use repository::{MemoryGatewayRepository, MemoryToolStatusSink};
