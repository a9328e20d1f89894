use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A stored link record.
///
/// Rows are never physically removed from the store: deletion and
/// expiration are expressed through `deleted` and `expires_at`, which keeps
/// the row around so its code can later be reclaimed by a new link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortLink {
    /// Store-assigned sequence number, opaque to callers.
    pub id: u64,
    /// The destination URL.
    pub long_url: String,
    /// The code under which the link is reachable.
    pub short_code: ShortCode,
    /// Clicks merged into the store so far. Buffered cache deltas are not
    /// included until the next flush.
    pub clicks: u64,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub deleted: bool,
}

impl ShortLink {
    /// Whether the link is live at `now`: not deleted and not past its
    /// expiration. Inactive links resolve to nothing and their codes are
    /// eligible for reclaim.
    pub fn is_active(&self, now: Timestamp) -> bool {
        !self.deleted && self.expires_at.map_or(true, |expires_at| expires_at > now)
    }
}

/// The caller-supplied part of a link, used for inserts and reclaims.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub long_url: String,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

/// The cached mirror of a link's lookup entry.
///
/// Carries `expires_at` so a cache hit can be expiry-checked without a
/// store round-trip. Deleted links are handled by explicit invalidation
/// instead: `deleted` never appears here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedLink {
    pub long_url: String,
    pub expires_at: Option<Timestamp>,
}

impl CachedLink {
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at > now)
    }
}

impl From<&ShortLink> for CachedLink {
    fn from(link: &ShortLink) -> Self {
        Self {
            long_url: link.long_url.clone(),
            expires_at: link.expires_at,
        }
    }
}
