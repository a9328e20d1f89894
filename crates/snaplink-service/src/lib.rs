//! Shortener service implementation.
//!
//! This crate provides [`ShortenerService`], the facade behind the HTTP
//! gateway: link creation with bounded collision retry and code reclaim,
//! cache-first resolution, previews, soft deletion, and buffered click
//! accounting with a periodic flush task.

pub mod clicks;
pub mod service;

pub use clicks::{ClickAccumulator, FlusherHandle, DEFAULT_FLUSH_INTERVAL};
pub use service::{ShortenerService, DEFAULT_MAX_ATTEMPTS};
