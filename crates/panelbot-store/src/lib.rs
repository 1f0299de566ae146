//! Storage collaborator interfaces.
//!
//! Persistence is outside this workspace's scope: the pipeline talks to a
//! key-value/relational store through the CRUD traits defined here. The
//! in-memory implementations back single-instance deployments and every
//! test in the workspace. All trait methods return `Result` so callers can
//! fail closed when the store misbehaves.

pub mod limiter;
pub mod memory;
pub mod traits;

pub use limiter::{RateLimiter, SlidingWindowLimiter};
pub use memory::MemoryStore;
pub use traits::{
    ClaimResult, CommandStore, CooldownStore, MappingStore, OrderStore, PolicyStore, StoreError,
};
