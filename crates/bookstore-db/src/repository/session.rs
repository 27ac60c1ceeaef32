//! # Session Repository
//!
//! Server-side record of issued tokens. A token is honoured only while its
//! `jti` has a row here that has not expired; signing out deletes the row.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Repository for sign-in sessions.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Records a freshly issued token.
    pub async fn create(
        &self,
        session_id: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(user_id, "Opening session");

        sqlx::query(
            "INSERT INTO sessions (session_id, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(Utc::now())
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Whether the session exists and has not expired at `now`.
    pub async fn is_active(&self, session_id: &str, now: DateTime<Utc>) -> DbResult<bool> {
        let active: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM sessions WHERE session_id = ?1 AND expires_at > ?2)",
        )
        .bind(session_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(active)
    }

    /// Ends a session. Returns whether a row was removed.
    pub async fn delete(&self, session_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE session_id = ?1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        debug!(removed = result.rows_affected(), "Session closed");
        Ok(result.rows_affected() > 0)
    }

    /// Removes every session that expired before `now`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;
    use chrono::Duration;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let db = memory_db().await;
        let user = db.users().create("Admin", "admin@b.co", "changeme").await.unwrap();
        let sessions = db.sessions();
        let now = Utc::now();

        sessions
            .create("jti-1", user.user_id, now + Duration::hours(1))
            .await
            .unwrap();
        assert!(sessions.is_active("jti-1", now).await.unwrap());
        assert!(!sessions.is_active("jti-1", now + Duration::hours(2)).await.unwrap());

        assert!(sessions.delete("jti-1").await.unwrap());
        assert!(!sessions.is_active("jti-1", now).await.unwrap());
        assert!(!sessions.delete("jti-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let db = memory_db().await;
        let user = db.users().create("Admin", "admin@b.co", "changeme").await.unwrap();
        let now = Utc::now();

        db.sessions()
            .create("old", user.user_id, now - Duration::minutes(1))
            .await
            .unwrap();
        db.sessions()
            .create("live", user.user_id, now + Duration::minutes(30))
            .await
            .unwrap();

        assert_eq!(db.sessions().purge_expired(now).await.unwrap(), 1);
        assert!(db.sessions().is_active("live", now).await.unwrap());
    }
}
