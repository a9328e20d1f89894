use crate::link::ShortLink;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// Expiration policy for a shortened URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExpirationPolicy {
    /// The shortened URL never expires.
    Never,
    /// The shortened URL expires after a certain duration from now.
    AfterDuration(SignedDuration),
    /// The shortened URL expires at a specific timestamp.
    AtTimestamp(Timestamp),
}

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    pub long_url: String,
    /// The expiration policy for the shortened URL.
    pub expiration: ExpirationPolicy,
    /// Optional caller-chosen code. Collisions on a custom code fail with
    /// `DuplicateCode` instead of silently falling back to a generated one.
    pub custom_code: Option<ShortCode>,
}

/// A read of a link's destination and click count, with no side effect.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPreview {
    pub long_url: String,
    pub clicks: u64,
}

/// The facade the request layer calls.
#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Creates a shortened URL and returns its short code.
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode>;

    /// Resolves a short code to its destination URL, recording a click.
    /// Returns `None` if the code is unknown, deleted, or expired.
    async fn resolve(&self, code: &ShortCode) -> Result<Option<String>>;

    /// Reads a link's destination and click count without recording a click.
    /// Returns `None` under the same conditions as [`resolve`](Self::resolve).
    async fn preview(&self, code: &ShortCode) -> Result<Option<LinkPreview>>;

    /// Marks a link as deleted and drops its cached lookup entry.
    /// Returns `false` if no row with that code exists at all; deleting an
    /// already-inactive code succeeds.
    async fn delete(&self, code: &ShortCode) -> Result<bool>;

    /// Returns up to `limit` links, most recently created first.
    async fn recent(&self, limit: usize) -> Result<Vec<ShortLink>>;
}
