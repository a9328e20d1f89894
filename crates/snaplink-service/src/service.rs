use crate::clicks::ClickAccumulator;
use async_trait::async_trait;
use jiff::Timestamp;
use snaplink_core::{
    CachedLink, ExpirationPolicy, LinkCache, LinkPreview, LinkStore, NewLink, ShortCode, ShortLink,
    Shortener, ShortenerError, ShortenParams,
};
use snaplink_generator::Generator;
use std::sync::Arc;
use tracing::{debug, trace, warn};

type Result<T> = std::result::Result<T, ShortenerError>;

/// Default bound on candidate attempts during creation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// A concrete implementation of the [`Shortener`] facade.
///
/// Wraps a store, a cache and a code generator to handle:
/// - candidate generation with bounded collision retry
/// - reclaim of deleted/expired codes
/// - cache-first resolution with store fallback and backfill
/// - buffered click accounting (via [`ClickAccumulator`])
///
/// The store's conflict-safe insert is the authority on uniqueness; cache
/// checks along the way are advisory shortcuts only.
pub struct ShortenerService<S, C, G> {
    store: Arc<S>,
    cache: Arc<C>,
    generator: Arc<G>,
    clicks: Arc<ClickAccumulator<S, C>>,
    max_attempts: u32,
}

impl<S, C, G> Clone for ShortenerService<S, C, G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            generator: Arc::clone(&self.generator),
            clicks: Arc::clone(&self.clicks),
            max_attempts: self.max_attempts,
        }
    }
}

impl<S: LinkStore, C: LinkCache, G: Generator> ShortenerService<S, C, G> {
    /// Creates a new service with the default attempt bound.
    pub fn new(store: S, cache: C, generator: G) -> Self {
        Self::with_max_attempts(store, cache, generator, DEFAULT_MAX_ATTEMPTS)
    }

    /// Creates a new service with a custom bound on candidate attempts.
    pub fn with_max_attempts(store: S, cache: C, generator: G, max_attempts: u32) -> Self {
        let store = Arc::new(store);
        let cache = Arc::new(cache);
        let clicks = Arc::new(ClickAccumulator::new(Arc::clone(&store), Arc::clone(&cache)));
        Self {
            store,
            cache,
            generator: Arc::new(generator),
            clicks,
            max_attempts,
        }
    }

    /// Returns the click accumulator, shared with the flush task.
    pub fn clicks(&self) -> &Arc<ClickAccumulator<S, C>> {
        &self.clicks
    }

    /// Returns a reference to the store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns a reference to the cache.
    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// Validates that the URL has an http(s) scheme and a host.
    fn validate_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(ShortenerError::InvalidUrl("URL cannot be empty".to_string()));
        }

        let parts: Vec<&str> = url.split("://").collect();
        if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a valid scheme and host: {}",
                url
            )));
        }

        let scheme = parts[0].to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL scheme must be http or https: {}",
                scheme
            )));
        }

        Ok(())
    }

    /// Converts an expiration policy to an optional absolute timestamp.
    ///
    /// Past timestamps are allowed: they create an immediately-inactive
    /// link, which is well-defined (and reclaim-eligible) rather than an
    /// input error.
    fn resolve_expiration(expiration: &ExpirationPolicy) -> Result<Option<Timestamp>> {
        match expiration {
            ExpirationPolicy::Never => Ok(None),
            ExpirationPolicy::AfterDuration(duration) => Timestamp::now()
                .checked_add(*duration)
                .map(Some)
                .map_err(|e| ShortenerError::InvalidExpiration(format!("invalid duration: {e}"))),
            ExpirationPolicy::AtTimestamp(timestamp) => Ok(Some(*timestamp)),
        }
    }

    /// Writes a lookup entry through to the cache. Best effort: the store
    /// row is already in place, a miss just means a later backfill.
    async fn write_through(&self, code: &ShortCode, long_url: &str, expires_at: Option<Timestamp>) {
        let entry = CachedLink {
            long_url: long_url.to_string(),
            expires_at,
        };
        if let Err(e) = self.cache.set(code, &entry).await {
            warn!(code = %code, error = %e, "failed to write lookup entry to cache");
        }
    }
}

#[async_trait]
impl<S: LinkStore, C: LinkCache, G: Generator> Shortener for ShortenerService<S, C, G> {
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode> {
        Self::validate_url(&params.long_url)?;
        let expires_at = Self::resolve_expiration(&params.expiration)?;

        // Custom codes are a user decision: when taken, they fail loudly
        // with DuplicateCode instead of silently falling back to a random
        // candidate. Random collisions retry silently.
        let is_custom = params.custom_code.is_some();
        let mut candidate = match params.custom_code {
            Some(code) => code,
            None => self.generator.generate(),
        };

        for attempt in 1..=self.max_attempts {
            trace!(attempt, candidate = %candidate, "trying short code candidate");
            let now = Timestamp::now();

            // Advisory pre-check: a live cached entry means the code is
            // taken, no store round-trip needed. Cache errors fall through
            // to the store, the authority.
            if let Ok(Some(entry)) = self.cache.get(&candidate).await {
                if entry.is_live(now) {
                    if is_custom {
                        return Err(ShortenerError::DuplicateCode(candidate.to_string()));
                    }
                    candidate = self.generator.generate();
                    continue;
                }
            }

            match self.store.get(&candidate).await? {
                Some(row) if row.is_active(now) => {
                    if is_custom {
                        return Err(ShortenerError::DuplicateCode(candidate.to_string()));
                    }
                    candidate = self.generator.generate();
                }
                Some(_) => {
                    // Inactive row: its code is eligible for reclaim. The
                    // store re-checks inactivity atomically, so a lost race
                    // is handled like any other collision.
                    let link = NewLink {
                        long_url: params.long_url.clone(),
                        created_at: now,
                        expires_at,
                    };
                    if self.store.reclaim(&candidate, link).await? {
                        debug!(code = %candidate, "reclaimed inactive short code");
                        self.write_through(&candidate, &params.long_url, expires_at)
                            .await;
                        return Ok(candidate);
                    }
                    if is_custom {
                        return Err(ShortenerError::DuplicateCode(candidate.to_string()));
                    }
                    candidate = self.generator.generate();
                }
                None => {
                    let link = NewLink {
                        long_url: params.long_url.clone(),
                        created_at: now,
                        expires_at,
                    };
                    if self.store.insert_if_absent(&candidate, link).await? {
                        debug!(code = %candidate, "created short link");
                        self.write_through(&candidate, &params.long_url, expires_at)
                            .await;
                        return Ok(candidate);
                    }
                    // A concurrent creation won the race for this code.
                    if is_custom {
                        return Err(ShortenerError::DuplicateCode(candidate.to_string()));
                    }
                    candidate = self.generator.generate();
                }
            }
        }

        debug!(
            attempts = self.max_attempts,
            "exhausted short code candidates"
        );
        Err(ShortenerError::CollisionExhausted {
            attempts: self.max_attempts,
        })
    }

    async fn resolve(&self, code: &ShortCode) -> Result<Option<String>> {
        trace!(code = %code, "resolving short code");
        let now = Timestamp::now();

        // Fast path: the cached entry carries its expiration, so liveness
        // is checked without a store round-trip.
        match self.cache.get(code).await {
            Ok(Some(entry)) => {
                if !entry.is_live(now) {
                    debug!(code = %code, "cached link has expired");
                    return Ok(None);
                }
                self.clicks.record(code).await;
                return Ok(Some(entry.long_url));
            }
            Ok(None) => trace!(code = %code, "cache miss, falling back to store"),
            Err(e) => warn!(code = %code, error = %e, "cache error on lookup, falling back to store"),
        }

        match self.store.get(code).await? {
            Some(row) if row.is_active(now) => {
                self.write_through(code, &row.long_url, row.expires_at).await;
                self.clicks.record(code).await;
                debug!(code = %code, url = %row.long_url, "resolved short code from store");
                Ok(Some(row.long_url))
            }
            Some(_) => {
                debug!(code = %code, "short code is inactive");
                Ok(None)
            }
            None => {
                trace!(code = %code, "short code not found");
                Ok(None)
            }
        }
    }

    async fn preview(&self, code: &ShortCode) -> Result<Option<LinkPreview>> {
        trace!(code = %code, "previewing short code");

        // Always reads the store: the click count lives there, and no
        // click is recorded on this path.
        match self.store.get(code).await? {
            Some(row) if row.is_active(Timestamp::now()) => Ok(Some(LinkPreview {
                long_url: row.long_url,
                clicks: row.clicks,
            })),
            _ => Ok(None),
        }
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        if self.store.get(code).await?.is_none() {
            return Ok(false);
        }

        // Idempotent on rows that exist: re-deleting an inactive link
        // succeeds. Pending click counters are left alone; the next flush
        // applies them to the dead row harmlessly.
        self.store.set_deleted(code).await?;
        self.cache.del(code).await?;
        debug!(code = %code, "deleted short link");
        Ok(true)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ShortLink>> {
        Ok(self.store.list_recent(limit).await?)
    }
}
