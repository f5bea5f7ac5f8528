//! Historical username repository.
//!
//! Append-only: a (user, name) pair is recorded once and never pruned.
//! The pipeline reads these to match filters against names a user has
//! since changed away from.

use super::DbError;
use crate::platform::UserId;
use sqlx::SqlitePool;

/// Repository for historical usernames.
pub struct UsernameRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UsernameRepository<'a> {
    pub(super) fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record an observed username. Idempotent per (user, name) pair.
    pub async fn record(&self, user: UserId, name: &str) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO usernames (user_id, name, first_seen_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user.0 as i64)
        .bind(name)
        .bind(now)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Every username ever observed for the user.
    pub async fn usernames_of(&self, user: UserId) -> Result<Vec<String>, DbError> {
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT DISTINCT name FROM usernames WHERE user_id = ?",
        )
        .bind(user.0 as i64)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}
