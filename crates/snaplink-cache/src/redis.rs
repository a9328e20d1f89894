use async_trait::async_trait;
use redis::AsyncCommands;
use snaplink_core::cache::Result;
use snaplink_core::{CacheError, CachedLink, LinkCache, ShortCode};
use tracing::{debug, trace, warn};

const DEFAULT_NAMESPACE: &str = "sl:";

/// Key layout for the two cache keyspaces under one namespace.
#[derive(Debug, Clone)]
struct KeySpace {
    url_prefix: String,
    clicks_prefix: String,
}

impl KeySpace {
    fn new(namespace: &str) -> Self {
        Self {
            url_prefix: format!("{namespace}url:"),
            clicks_prefix: format!("{namespace}clicks:"),
        }
    }

    fn url(&self, code: &ShortCode) -> String {
        format!("{}{}", self.url_prefix, code.as_str())
    }

    fn clicks(&self, code: &ShortCode) -> String {
        format!("{}{}", self.clicks_prefix, code.as_str())
    }

    fn clicks_pattern(&self) -> String {
        format!("{}*", self.clicks_prefix)
    }

    fn code_from_clicks_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(&self.clicks_prefix)
    }
}

/// A Redis-based implementation of [`LinkCache`].
///
/// Lookup entries are stored as JSON strings under `<ns>url:<code>`;
/// pending click counters are plain integers under `<ns>clicks:<code>`,
/// driven by INCRBY/DECRBY so increment and discharge stay atomic on the
/// server. The two keyspaces share a namespace but never a key.
#[derive(Debug, Clone)]
pub struct RedisCache {
    conn: redis::aio::MultiplexedConnection,
    keys: KeySpace,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if message.to_ascii_lowercase().contains("timed out") {
        CacheError::Timeout(message)
    } else {
        CacheError::Operation(message)
    }
}

impl RedisCache {
    /// Creates a Redis cache under the default `sl:` namespace.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_namespace(conn, DEFAULT_NAMESPACE)
    }

    /// Creates a Redis cache with a custom key namespace (e.g. `"myapp:"`).
    pub fn with_namespace(
        conn: redis::aio::MultiplexedConnection,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            keys: KeySpace::new(&namespace.into()),
        }
    }
}

#[async_trait]
impl LinkCache for RedisCache {
    async fn get(&self, code: &ShortCode) -> Result<Option<CachedLink>> {
        let key = self.keys.url(code);
        trace!(code = %code, "fetching lookup entry from Redis");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(cached)) => match serde_json::from_str::<CachedLink>(&cached) {
                Ok(link) => {
                    debug!(code = %code, "cache hit in Redis");
                    Ok(Some(link))
                }
                Err(e) => {
                    warn!(code = %code, error = %e, "failed to deserialize cached entry");
                    Err(CacheError::InvalidData(format!(
                        "invalid cached value for key '{key}': {e}"
                    )))
                }
            },
            Ok(None) => {
                trace!(code = %code, "cache miss in Redis");
                Ok(None)
            }
            Err(e) => Err(map_redis_error("failed to fetch value from Redis", e)),
        }
    }

    async fn set(&self, code: &ShortCode, link: &CachedLink) -> Result<()> {
        let key = self.keys.url(code);
        trace!(code = %code, "storing lookup entry in Redis");

        let json = serde_json::to_string(link).map_err(|e| {
            CacheError::Serialization(format!("failed to serialize cache value: {e}"))
        })?;

        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(&key, json)
            .await
            .map_err(|e| map_redis_error("failed to write value to Redis", e))?;

        debug!(code = %code, "cached lookup entry in Redis");
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        let key = self.keys.url(code);
        trace!(code = %code, "removing lookup entry from Redis");

        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&key)
            .await
            .map_err(|e| map_redis_error("failed to delete value from Redis", e))?;

        Ok(())
    }

    async fn incr_pending(&self, code: &ShortCode) -> Result<i64> {
        let key = self.keys.clicks(code);

        let mut conn = self.conn.clone();
        conn.incr::<_, _, i64>(&key, 1)
            .await
            .map_err(|e| map_redis_error("failed to increment pending clicks", e))
    }

    async fn pending_codes(&self) -> Result<Vec<String>> {
        let pattern = self.keys.clicks_pattern();
        let mut conn = self.conn.clone();

        let mut codes = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| map_redis_error("failed to scan pending click keys", e))?;

            codes.extend(
                keys.iter()
                    .filter_map(|key| self.keys.code_from_clicks_key(key))
                    .map(str::to_string),
            );

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(codes)
    }

    async fn pending_delta(&self, code: &ShortCode) -> Result<i64> {
        let key = self.keys.clicks(code);

        let mut conn = self.conn.clone();
        let delta: Option<i64> = conn
            .get(&key)
            .await
            .map_err(|e| map_redis_error("failed to read pending clicks", e))?;

        Ok(delta.unwrap_or(0))
    }

    async fn discharge_pending(&self, code: &ShortCode, observed: i64) -> Result<()> {
        let key = self.keys.clicks(code);

        // DECRBY, not DEL: increments that landed after the flush observed
        // the delta survive the discharge. A counter drained to zero stays
        // behind as a zero-valued key and is skipped by later flushes.
        let mut conn = self.conn.clone();
        let remaining: i64 = conn
            .decr(&key, observed)
            .await
            .map_err(|e| map_redis_error("failed to discharge pending clicks", e))?;

        trace!(code = %code, observed, remaining, "discharged pending clicks");
        Ok(())
    }
}
