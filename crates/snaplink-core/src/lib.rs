//! Core types and traits for the Snaplink URL shortener.
//!
//! This crate provides the shared record types, the store and cache
//! contracts, and the service facade trait used by the shortener service
//! and the HTTP gateway.

pub mod cache;
pub mod error;
pub mod link;
pub mod shortcode;
pub mod shortener;
pub mod store;

pub use cache::LinkCache;
pub use error::{CacheError, ShortenerError, StoreError};
pub use link::{CachedLink, NewLink, ShortLink};
pub use shortcode::ShortCode;
pub use shortener::{ExpirationPolicy, LinkPreview, Shortener, ShortenParams};
pub use store::LinkStore;
