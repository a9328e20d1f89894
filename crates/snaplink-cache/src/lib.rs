//! Cache backends for Snaplink.
//!
//! Both backends implement [`snaplink_core::LinkCache`]: a lookup mirror of
//! the store plus per-code pending click counters, kept in independent
//! keyspaces.

pub mod memory;
pub mod redis;

pub use memory::MemoryCache;
pub use redis::RedisCache;
