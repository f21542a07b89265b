//! Sliding-window admission logic and state management.

mod key;
mod limiter;
mod memory;
mod redis;
mod registry;
mod store;

pub use key::AdmissionKey;
pub use limiter::{AdmissionDecision, RateLimiter};
pub use memory::MemoryWindowStore;
pub use redis::RedisWindowStore;
pub use registry::{ConfigScope, LimitConfig, LimitRegistry};
pub use store::WindowStore;
