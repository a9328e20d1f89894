use crate::error::StoreError;
use crate::link::{NewLink, ShortLink};
use crate::shortcode::ShortCode;
use async_trait::async_trait;

/// Type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

/// The durable record of code-to-URL mappings.
///
/// `insert_if_absent` is the sole source of truth for code uniqueness:
/// implementations must make it atomic (a unique-constraint insert, or an
/// equivalent compare-and-swap), because cache-level existence checks are
/// advisory only. `reclaim` must likewise be conditional on the row still
/// being inactive so two concurrent creations cannot both take over a
/// dead code.
#[async_trait]
pub trait LinkStore: Send + Sync + 'static {
    /// Inserts a new row for `code` if none exists.
    /// Returns `false` when another row (active or not) already owns the code.
    async fn insert_if_absent(&self, code: &ShortCode, link: NewLink) -> Result<bool>;

    /// Takes over an inactive row: overwrites the URL, resets clicks to 0,
    /// clears the deleted flag and refreshes the timestamps.
    /// Returns `false` if the row is missing or no longer inactive.
    async fn reclaim(&self, code: &ShortCode, link: NewLink) -> Result<bool>;

    /// Retrieves the row for a short code, live or not.
    /// Returns `None` only when no row with that code has ever been written.
    async fn get(&self, code: &ShortCode) -> Result<Option<ShortLink>>;

    /// Adds a click delta to the row's counter. A missing row is not an
    /// error: buffered clicks may outlive their link.
    async fn add_clicks(&self, code: &ShortCode, delta: u64) -> Result<()>;

    /// Marks the row as deleted. Returns `true` if a row with that code
    /// exists, whether or not it was already deleted.
    async fn set_deleted(&self, code: &ShortCode) -> Result<bool>;

    /// Returns up to `limit` rows, most recently created first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<ShortLink>>;
}
