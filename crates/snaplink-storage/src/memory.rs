use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use snaplink_core::store::Result;
use snaplink_core::{LinkStore, NewLink, ShortCode, ShortLink};
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory implementation of the [`LinkStore`] contract using DashMap.
///
/// DashMap's sharded locks give the per-key atomicity the contract needs:
/// `insert_if_absent` uses the vacant-entry API and `reclaim` re-checks
/// liveness under the shard guard, so concurrent creations of the same code
/// cannot both succeed.
///
/// Inactive rows are kept, never evicted: an expired or deleted row still
/// owns its id and click history until a reclaim overwrites it.
#[derive(Debug)]
pub struct InMemoryStore {
    links: DashMap<String, ShortLink>,
    next_id: AtomicU64,
}

impl InMemoryStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self {
            links: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkStore for InMemoryStore {
    async fn insert_if_absent(&self, code: &ShortCode, link: NewLink) -> Result<bool> {
        match self.links.entry(code.as_str().to_owned()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                slot.insert(ShortLink {
                    id,
                    long_url: link.long_url,
                    short_code: code.clone(),
                    clicks: 0,
                    created_at: link.created_at,
                    expires_at: link.expires_at,
                    deleted: false,
                });
                Ok(true)
            }
        }
    }

    async fn reclaim(&self, code: &ShortCode, link: NewLink) -> Result<bool> {
        let Some(mut row) = self.links.get_mut(code.as_str()) else {
            return Ok(false);
        };

        // Re-check under the shard guard: a concurrent reclaim or insert
        // may have revived the row since the caller looked at it.
        if row.is_active(Timestamp::now()) {
            return Ok(false);
        }

        row.long_url = link.long_url;
        row.clicks = 0;
        row.created_at = link.created_at;
        row.expires_at = link.expires_at;
        row.deleted = false;
        Ok(true)
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<ShortLink>> {
        Ok(self.links.get(code.as_str()).map(|row| row.clone()))
    }

    async fn add_clicks(&self, code: &ShortCode, delta: u64) -> Result<()> {
        if let Some(mut row) = self.links.get_mut(code.as_str()) {
            row.clicks += delta;
        }
        Ok(())
    }

    async fn set_deleted(&self, code: &ShortCode) -> Result<bool> {
        match self.links.get_mut(code.as_str()) {
            Some(mut row) => {
                row.deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ShortLink>> {
        let mut rows: Vec<ShortLink> = self.links.iter().map(|row| row.clone()).collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        rows.truncate(limit);
        Ok(rows)
    }
}
