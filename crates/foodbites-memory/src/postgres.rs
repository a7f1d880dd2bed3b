//! PostgreSQL session store.
//!
//! One row per user in `bot_sessions`, with the state as JSONB and an absolute
//! expiry. Shared by every bot instance pointed at the same database:
//! - Reads ignore rows past `expires_at`
//! - Writes upsert and push `expires_at` forward by the TTL
//! - [`PgSessionStore::purge_expired`] deletes stale rows

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::info;

use foodbites_types::errors::BotError;
use foodbites_types::traits::SessionStore;
use foodbites_types::SessionState;

// ============================================================
// SQL Migrations (run in constructor, not via sqlx::migrate!)
// ============================================================

const MIGRATION_CREATE_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS bot_sessions (\
    user_id TEXT PRIMARY KEY, \
    state JSONB NOT NULL, \
    expires_at TIMESTAMPTZ NOT NULL, \
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()\
)";

const MIGRATION_EXPIRES_AT_INDEX: &str = "\
CREATE INDEX IF NOT EXISTS idx_bot_sessions_expires_at \
ON bot_sessions (expires_at)";

// ============================================================
// PgSessionStore
// ============================================================

/// PostgreSQL-backed session store with expiry.
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Create a new session store, connecting to PostgreSQL at the given URL.
    ///
    /// Runs schema migrations on construction to ensure the table exists.
    pub async fn new(database_url: &str) -> Result<Self, BotError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| BotError::Database(format!("connection failed: {e}")))?;
        Self::from_pool(pool).await
    }

    /// Create a session store from an existing connection pool.
    pub async fn from_pool(pool: PgPool) -> Result<Self, BotError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), BotError> {
        for sql in [MIGRATION_CREATE_TABLE, MIGRATION_EXPIRES_AT_INDEX] {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| BotError::Database(format!("migration failed: {e}")))?;
        }

        info!("session store migrations applied successfully");
        Ok(())
    }

    /// Delete every expired session. Returns how many rows were removed.
    pub async fn purge_expired(&self) -> Result<u64, BotError> {
        let result = sqlx::query("DELETE FROM bot_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| BotError::Database(format!("purge failed: {e}")))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn get(&self, user_id: &str) -> Result<SessionState, BotError> {
        let row = sqlx::query(
            "SELECT state FROM bot_sessions \
             WHERE user_id = $1 AND expires_at > NOW()",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BotError::Database(e.to_string()))?;

        match row {
            Some(row) => {
                let state: Json<SessionState> = row
                    .try_get("state")
                    .map_err(|e| BotError::Session(format!("corrupt session for {user_id}: {e}")))?;
                Ok(state.0)
            }
            None => Ok(SessionState::default()),
        }
    }

    async fn put(
        &self,
        user_id: &str,
        state: &SessionState,
        ttl: std::time::Duration,
    ) -> Result<(), BotError> {
        sqlx::query(
            "INSERT INTO bot_sessions (user_id, state, expires_at, updated_at) \
             VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'), NOW()) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 state = EXCLUDED.state, \
                 expires_at = EXCLUDED.expires_at, \
                 updated_at = NOW()",
        )
        .bind(user_id)
        .bind(Json(state))
        .bind(ttl.as_secs_f64())
        .execute(&self.pool)
        .await
        .map_err(|e| BotError::Database(format!("session upsert failed: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    // ----------------------------------------------------------
    // Integration tests (require DATABASE_URL env var)
    // ----------------------------------------------------------

    async fn create_store() -> PgSessionStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        PgSessionStore::new(&url)
            .await
            .expect("failed to create store")
    }

    fn unique_user() -> String {
        format!("test-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
    }

    #[tokio::test]
    #[ignore]
    async fn test_put_and_get() {
        let store = create_store().await;
        let user = unique_user();

        let mut state = SessionState::default();
        state.mark_welcomed(Utc::now(), "intro");
        state.record_exchange("do you deliver?", "Yes!", 6);

        store
            .put(&user, &state, Duration::from_secs(60))
            .await
            .unwrap();
        let loaded = store.get(&user).await.unwrap();

        assert!(loaded.greeted);
        assert_eq!(loaded.chat_history, state.chat_history);
        assert_eq!(loaded.intent.as_deref(), Some("intro"));
    }

    #[tokio::test]
    #[ignore]
    async fn test_unknown_user_gets_default() {
        let store = create_store().await;
        let state = store.get(&unique_user()).await.unwrap();
        assert_eq!(state, SessionState::default());
    }

    #[tokio::test]
    #[ignore]
    async fn test_upsert_overwrites() {
        let store = create_store().await;
        let user = unique_user();

        let mut state = SessionState::default();
        store.put(&user, &state, Duration::from_secs(60)).await.unwrap();
        state.intent = Some("menu".to_string());
        store.put(&user, &state, Duration::from_secs(60)).await.unwrap();

        assert_eq!(
            store.get(&user).await.unwrap().intent.as_deref(),
            Some("menu")
        );
    }

    #[tokio::test]
    #[ignore]
    async fn test_expired_row_is_invisible_and_purged() {
        let store = create_store().await;
        let user = unique_user();

        let mut state = SessionState::default();
        state.greeted = true;
        store
            .put(&user, &state, Duration::from_millis(200))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert!(!store.get(&user).await.unwrap().greeted);
        assert!(store.purge_expired().await.unwrap() >= 1);
    }
}
