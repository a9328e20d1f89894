use async_trait::async_trait;
use jiff::Timestamp;
use snaplink_core::error::StoreError;
use snaplink_core::store::Result;
use snaplink_core::{LinkStore, NewLink, ShortCode, ShortLink};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

/// MySQL implementation of the [`LinkStore`] contract.
///
/// The unique key on `short_code` is the authority for uniqueness:
/// `insert_if_absent` reports a caught unique violation as `false` rather
/// than an error, and `reclaim` is a single conditional UPDATE whose WHERE
/// clause re-checks inactivity, so concurrent takeovers of the same dead
/// code admit exactly one winner.
///
/// Timestamps are stored as unix seconds. Rows are soft deleted via the
/// `deleted` flag and kept past expiration.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Operation(e.to_string()))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn now_unix_seconds() -> i64 {
    Timestamp::now().as_second()
}

fn parse_timestamp(column: &str, seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds).map_err(|e| {
        StoreError::InvalidData(format!("invalid {column} timestamp '{seconds}': {e}"))
    })
}

fn parse_expire_at(seconds: Option<i64>) -> Result<Option<Timestamp>> {
    seconds
        .map(|value| parse_timestamp("expires_at", value))
        .transpose()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StoreError::InvalidData(message),
        _ => StoreError::Query(message),
    }
}

fn link_from_row(row: &MySqlRow) -> Result<ShortLink> {
    let id: u64 = row.try_get("id").map_err(map_sqlx_error)?;
    let short_code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let long_url: String = row.try_get("long_url").map_err(map_sqlx_error)?;
    let clicks: u64 = row.try_get("clicks").map_err(map_sqlx_error)?;
    let created_at_raw: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let expires_at_raw: Option<i64> = row.try_get("expires_at").map_err(map_sqlx_error)?;
    let deleted: bool = row.try_get("deleted").map_err(map_sqlx_error)?;

    Ok(ShortLink {
        id,
        long_url,
        short_code: ShortCode::new_unchecked(short_code),
        clicks,
        created_at: parse_timestamp("created_at", created_at_raw)?,
        expires_at: parse_expire_at(expires_at_raw)?,
        deleted,
    })
}

#[async_trait]
impl LinkStore for MySqlStore {
    async fn insert_if_absent(&self, code: &ShortCode, link: NewLink) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO short_links (short_code, long_url, clicks, created_at, expires_at, deleted)
            VALUES (?, ?, 0, ?, ?, 0)
            "#,
        )
        .bind(code.as_str())
        .bind(link.long_url)
        .bind(link.created_at.as_second())
        .bind(link.expires_at.map(|ts| ts.as_second()))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) if is_unique_violation(&err) => Ok(false),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn reclaim(&self, code: &ShortCode, link: NewLink) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE short_links
            SET long_url = ?, clicks = 0, created_at = ?, expires_at = ?, deleted = 0
            WHERE short_code = ?
              AND (deleted = 1 OR (expires_at IS NOT NULL AND expires_at <= ?))
            "#,
        )
        .bind(link.long_url)
        .bind(link.created_at.as_second())
        .bind(link.expires_at.map(|ts| ts.as_second()))
        .bind(code.as_str())
        .bind(now_unix_seconds())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<ShortLink>> {
        let row = sqlx::query(
            r#"
            SELECT id, short_code, long_url, clicks, created_at, expires_at, deleted
            FROM short_links
            WHERE short_code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(link_from_row).transpose()
    }

    async fn add_clicks(&self, code: &ShortCode, delta: u64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE short_links
            SET clicks = clicks + ?
            WHERE short_code = ?
            "#,
        )
        .bind(delta)
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn set_deleted(&self, code: &ShortCode) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE short_links
            SET deleted = 1
            WHERE short_code = ?
            "#,
        )
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // An already-deleted row can report zero affected rows; only a
        // missing row counts as `false`.
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM short_links
            WHERE short_code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ShortLink>> {
        let rows = sqlx::query(
            r#"
            SELECT id, short_code, long_url, clicks, created_at, expires_at, deleted
            FROM short_links
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as u64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(link_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_maps_to_timeout() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            StoreError::Timeout(_)
        ));
    }

    #[test]
    fn pool_closed_maps_to_unavailable() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolClosed),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn decode_failure_maps_to_invalid_data() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            StoreError::InvalidData(_)
        ));
    }

    #[test]
    fn parse_expire_at_absent_is_none() {
        assert_eq!(parse_expire_at(None).unwrap(), None);
    }

    #[test]
    fn parse_expire_at_round_trips_unix_seconds() {
        let ts = Timestamp::from_second(1_700_000_000).unwrap();
        assert_eq!(parse_expire_at(Some(ts.as_second())).unwrap(), Some(ts));
    }

    #[test]
    fn parse_expire_at_rejects_out_of_range_values() {
        assert!(matches!(
            parse_expire_at(Some(i64::MAX)),
            Err(StoreError::InvalidData(_))
        ));
    }
}
