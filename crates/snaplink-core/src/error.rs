use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

/// Errors surfaced by the [`Shortener`](crate::Shortener) facade.
///
/// Validation, duplicate and collision failures are user-facing; store and
/// cache failures are wrapped with their message. "Not found" is not an
/// error: lookups return `Ok(None)` instead, so deleted, expired and
/// never-existing codes are indistinguishable to callers.
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("invalid expiration: {0}")]
    InvalidExpiration(String),
    #[error("short code already in use: {0}")]
    DuplicateCode(String),
    #[error("no free short code after {attempts} attempts")]
    CollisionExhausted { attempts: u32 },
    #[error("storage error: {0}")]
    Storage(String),
    #[error("cache error: {0}")]
    Cache(String),
}

impl From<StoreError> for ShortenerError {
    fn from(value: StoreError) -> Self {
        Self::Storage(value.to_string())
    }
}

impl From<CacheError> for ShortenerError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value.to_string())
    }
}
