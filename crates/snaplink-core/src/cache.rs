use crate::error::CacheError;
use crate::link::CachedLink;
use crate::shortcode::ShortCode;
use async_trait::async_trait;

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;

/// The fast lookup layer in front of the store.
///
/// Implementations hold two independent keyspaces: a lookup mirror of
/// code-to-link entries (written through on create, backfilled on store
/// fallback, invalidated on delete and reclaim) and per-code pending click
/// counters (incremented on redirects, drained by the periodic flush).
///
/// Every operation must be atomic on its own; no transactional link between
/// the cache and the store is assumed. In particular `discharge_pending`
/// subtracts the observed value rather than clearing the key, so increments
/// that land between the flush's read and its discharge are never dropped.
#[async_trait]
pub trait LinkCache: Send + Sync + 'static {
    /// Get the cached lookup entry for a code.
    ///
    /// Returns `Ok(None)` if the code is not in the cache.
    async fn get(&self, code: &ShortCode) -> Result<Option<CachedLink>>;

    /// Store the lookup entry for a code.
    async fn set(&self, code: &ShortCode, link: &CachedLink) -> Result<()>;

    /// Remove the lookup entry for a code.
    ///
    /// It is not an error if the key does not exist. Pending click counters
    /// are unaffected.
    async fn del(&self, code: &ShortCode) -> Result<()>;

    /// Atomically increment the pending click counter for a code,
    /// returning the new value.
    async fn incr_pending(&self, code: &ShortCode) -> Result<i64>;

    /// Snapshot of the codes that currently have a pending click counter.
    async fn pending_codes(&self) -> Result<Vec<String>>;

    /// Read the pending click delta for a code. Returns 0 if absent.
    async fn pending_delta(&self, code: &ShortCode) -> Result<i64>;

    /// Subtract `observed` from the pending counter for a code.
    ///
    /// Called after `observed` clicks have been merged into the store.
    async fn discharge_pending(&self, code: &ShortCode, observed: i64) -> Result<()>;
}
