//! Ban history repository.
//!
//! One row per (community, user) pair. The validation pipeline only reads
//! this table; rows are written by the event-ingestion collaborator when
//! it observes ban/unban events, and by tests.

use super::DbError;
use crate::platform::{CommunityId, UserId};
use sqlx::SqlitePool;

/// A ban of one user in one community.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanRecord {
    pub community_id: CommunityId,
    pub user_id: UserId,
    pub reason: Option<String>,
}

/// Repository for ban history.
pub struct BanRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BanRepository<'a> {
    pub(super) fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a ban, replacing any previous record for the pair.
    pub async fn record(
        &self,
        community: CommunityId,
        user: UserId,
        reason: Option<&str>,
    ) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO bans (community_id, user_id, reason, recorded_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(community.0 as i64)
        .bind(user.0 as i64)
        .bind(reason)
        .bind(now)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Remove a ban record (the user was unbanned).
    pub async fn remove(&self, community: CommunityId, user: UserId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM bans WHERE community_id = ? AND user_id = ?")
            .bind(community.0 as i64)
            .bind(user.0 as i64)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All recorded bans for one user, across every community.
    pub async fn bans_of(&self, user: UserId) -> Result<Vec<BanRecord>, DbError> {
        let rows = sqlx::query_as::<_, (i64, i64, Option<String>)>(
            r#"
            SELECT community_id, user_id, reason
            FROM bans
            WHERE user_id = ?
            "#,
        )
        .bind(user.0 as i64)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(community_id, user_id, reason)| BanRecord {
                community_id: CommunityId(community_id as u64),
                user_id: UserId(user_id as u64),
                reason,
            })
            .collect())
    }
}
