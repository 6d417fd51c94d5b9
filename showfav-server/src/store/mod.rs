//! Session store adapter
//!
//! Persists one [`SessionRecord`] per opaque session token in a shared SQLite
//! database. The pool is opened once at startup and shared by every request;
//! writes are plain upserts, so concurrent submissions for the same session
//! resolve last-write-wins.

mod record;

pub use record::SessionRecord;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::time::Duration;
use thiserror::Error;

use crate::session::SessionToken;
use record::StoredFavorites;

/// Session store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection lost, pool closed or timed out, or any other transport failure.
    /// Retryable.
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    /// A stored record exists but cannot be read back
    #[error("Session record unreadable: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Shared session store handle; cheap to clone
#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
    ttl: chrono::Duration,
}

impl SessionStore {
    /// Open the store, create its table and verify it answers a ping.
    ///
    /// Called once at startup; a failure here should abort the process.
    pub async fn connect(database_url: &str, ttl: Duration) -> Result<Self, StoreError> {
        tracing::debug!("Connecting to session store: {}", database_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Self::from_pool(pool, ttl).await
    }

    /// Wrap an existing pool (tests use a single-connection in-memory pool)
    pub async fn from_pool(pool: SqlitePool, ttl: Duration) -> Result<Self, StoreError> {
        let ttl = chrono::Duration::from_std(ttl)
            .ok()
            .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
            .ok_or_else(|| StoreError::Unavailable(format!("Invalid session TTL: {:?}", ttl)))?;
        let store = Self { pool, ttl };
        store.init_tables().await?;
        store.ping().await?;
        Ok(store)
    }

    async fn init_tables(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                record TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        tracing::info!("Session store tables initialized (sessions)");
        Ok(())
    }

    /// Health check independent of any user request
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Load the record for `token`; `None` when absent or expired
    pub async fn load(&self, token: &SessionToken) -> Result<Option<SessionRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT record, created_at, updated_at, expires_at FROM sessions WHERE token = ?",
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at = parse_time(row.get("expires_at"))?;
        if expires_at <= Utc::now() {
            tracing::debug!("Ignoring expired session record");
            return Ok(None);
        }

        let payload: String = row.get("record");
        let stored: StoredFavorites = serde_json::from_str(&payload)
            .map_err(|e| StoreError::Corrupt(format!("Failed to deserialize record: {}", e)))?;

        Ok(Some(SessionRecord {
            favorites: stored.favorites,
            current: stored.current,
            created_at: parse_time(row.get("created_at"))?,
            updated_at: parse_time(row.get("updated_at"))?,
        }))
    }

    /// Overwrite the record for `token` and push its expiry forward
    pub async fn save(&self, token: &SessionToken, record: &SessionRecord) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&StoredFavorites::from(record))
            .map_err(|e| StoreError::Corrupt(format!("Failed to serialize record: {}", e)))?;
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| StoreError::Unavailable("Session expiry out of range".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO sessions (token, record, created_at, updated_at, expires_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(token) DO UPDATE SET
                record = excluded.record,
                updated_at = excluded.updated_at,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(token.as_str())
        .bind(&payload)
        .bind(format_time(record.created_at))
        .bind(format_time(record.updated_at))
        .bind(format_time(expires_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete every expired record; returns how many were removed
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(format_time(Utc::now()))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Close the pool; later operations fail with [`StoreError::Unavailable`]
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Fixed-width UTC timestamps so text comparison matches time order
fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_time(raw: String) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("Failed to parse timestamp {}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use showfav_common::ShowId;

    const TTL: Duration = Duration::from_secs(3600);

    async fn memory_store(ttl: Duration) -> SessionStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SessionStore::from_pool(pool, ttl).await.unwrap()
    }

    fn ids(raw: &[&str]) -> Vec<ShowId> {
        raw.iter().map(|s| ShowId::parse(s).unwrap()).collect()
    }

    #[tokio::test]
    async fn missing_record_loads_as_none() {
        let store = memory_store(TTL).await;
        let loaded = store.load(&SessionToken::generate()).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = memory_store(TTL).await;
        let token = SessionToken::generate();
        let record = SessionRecord::new(ids(&["82", "1"]));

        store.save(&token, &record).await.unwrap();
        let loaded = store.load(&token).await.unwrap().unwrap();

        assert_eq!(loaded.current, ids(&["82", "1"]));
        assert_eq!(loaded.favorites, record.favorites);
        assert_eq!(
            format_time(loaded.created_at),
            format_time(record.created_at)
        );
    }

    #[tokio::test]
    async fn last_write_wins() {
        let store = memory_store(TTL).await;
        let token = SessionToken::generate();

        store.save(&token, &SessionRecord::new(ids(&["1"]))).await.unwrap();
        store.save(&token, &SessionRecord::new(ids(&["2"]))).await.unwrap();

        let loaded = store.load(&token).await.unwrap().unwrap();
        assert_eq!(loaded.current, ids(&["2"]));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = memory_store(TTL).await;
        let a = SessionToken::generate();
        let b = SessionToken::generate();

        store.save(&a, &SessionRecord::new(ids(&["5"]))).await.unwrap();

        assert!(store.load(&b).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_records_are_hidden_and_purged() {
        let store = memory_store(Duration::from_millis(1)).await;
        let token = SessionToken::generate();
        store.save(&token, &SessionRecord::new(ids(&["3"]))).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(store.load(&token).await.unwrap().is_none());
        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn closed_pool_reports_unavailable() {
        let store = memory_store(TTL).await;
        store.close().await;

        let token = SessionToken::generate();
        assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));
        assert!(matches!(store.load(&token).await, Err(StoreError::Unavailable(_))));
        assert!(matches!(
            store.save(&token, &SessionRecord::new(vec![])).await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn unreadable_payload_is_corrupt() {
        let store = memory_store(TTL).await;
        let token = SessionToken::generate();
        store.save(&token, &SessionRecord::new(ids(&["1"]))).await.unwrap();

        sqlx::query("UPDATE sessions SET record = 'not json' WHERE token = ?")
            .bind(token.as_str())
            .execute(&store.pool)
            .await
            .unwrap();

        assert!(matches!(store.load(&token).await, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn out_of_range_ttl_is_rejected() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let result = SessionStore::from_pool(pool, Duration::from_secs(10_000_000_000_000)).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn connect_fails_fast_on_unopenable_database() {
        let result = SessionStore::connect("sqlite:///nonexistent-dir/for/showfav.db?mode=ro", TTL).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
