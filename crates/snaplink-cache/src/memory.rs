use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use moka::future::Cache;
use snaplink_core::cache::Result;
use snaplink_core::{CachedLink, LinkCache, ShortCode};
use tracing::trace;

/// An in-process implementation of [`LinkCache`].
///
/// The lookup mirror lives in a bounded Moka cache; pending click counters
/// live in a DashMap whose sharded locks make increment and discharge
/// atomic per key. Ideal for single-node deployments and tests.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    lookup: Cache<String, CachedLink>,
    pending: DashMap<String, i64>,
}

impl MemoryCache {
    /// Creates a cache with the default lookup capacity of 10,000 entries.
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    /// Creates a cache with a custom maximum lookup capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            lookup: Cache::builder().max_capacity(max_capacity).build(),
            pending: DashMap::new(),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkCache for MemoryCache {
    async fn get(&self, code: &ShortCode) -> Result<Option<CachedLink>> {
        Ok(self.lookup.get(code.as_str()).await)
    }

    async fn set(&self, code: &ShortCode, link: &CachedLink) -> Result<()> {
        self.lookup
            .insert(code.as_str().to_string(), link.clone())
            .await;
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        self.lookup.invalidate(code.as_str()).await;
        Ok(())
    }

    async fn incr_pending(&self, code: &ShortCode) -> Result<i64> {
        let mut counter = self.pending.entry(code.as_str().to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn pending_codes(&self) -> Result<Vec<String>> {
        Ok(self.pending.iter().map(|e| e.key().clone()).collect())
    }

    async fn pending_delta(&self, code: &ShortCode) -> Result<i64> {
        Ok(self
            .pending
            .get(code.as_str())
            .map(|counter| *counter)
            .unwrap_or(0))
    }

    async fn discharge_pending(&self, code: &ShortCode, observed: i64) -> Result<()> {
        if let Entry::Occupied(mut counter) = self.pending.entry(code.as_str().to_string()) {
            *counter.get_mut() -= observed;
            // Drained counters are removed; the shard guard makes the
            // subtract-and-remove atomic against concurrent increments.
            if *counter.get() <= 0 {
                counter.remove();
            }
        }
        trace!(code = %code, observed, "discharged pending clicks");
        Ok(())
    }
}
