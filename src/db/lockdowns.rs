//! Lockdown persistence.
//!
//! A single row per community holding the lockdown expiry. The
//! in-memory controller writes through here so an active lockdown
//! survives a process restart.

use super::DbError;
use crate::platform::CommunityId;
use sqlx::SqlitePool;

/// Repository for persisted lockdown state.
pub struct LockdownRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LockdownRepository<'a> {
    pub(super) fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Set (or replace) a community's lockdown expiry.
    pub async fn set(&self, community: CommunityId, expires_at: i64) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO lockdowns (community_id, expires_at)
            VALUES (?, ?)
            "#,
        )
        .bind(community.0 as i64)
        .bind(expires_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Clear a community's lockdown.
    pub async fn clear(&self, community: CommunityId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM lockdowns WHERE community_id = ?")
            .bind(community.0 as i64)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All lockdowns expiring after `now` (unix seconds).
    pub async fn all_active(&self, now: i64) -> Result<Vec<(CommunityId, i64)>, DbError> {
        let rows = sqlx::query_as::<_, (i64, i64)>(
            "SELECT community_id, expires_at FROM lockdowns WHERE expires_at > ?",
        )
        .bind(now)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(community_id, expires_at)| (CommunityId(community_id as u64), expires_at))
            .collect())
    }
}
