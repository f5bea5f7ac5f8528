//! Read-through cache over the ban history repository.
//!
//! Keyed by user id; an entry holds every recorded ban for that user and
//! is refreshed lazily once it is older than the configured TTL. This is
//! a suspicion signal, not a security boundary, so staleness within the
//! TTL is acceptable.
//!
//! Queries are filtered to a caller-supplied community set, so asking
//! about communities the deployment no longer serves simply yields
//! nothing.

use crate::db::{BanRecord, Database, DbError};
use crate::platform::{CommunityId, UserId};
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// A cached snapshot of one user's ban history.
#[derive(Debug, Clone)]
struct CachedBans {
    records: Vec<BanRecord>,
    fetched_at: Instant,
}

/// Read-through, TTL-refreshed ban history cache.
pub struct BanStorage {
    db: Database,
    ttl: Duration,
    cache: DashMap<UserId, CachedBans>,
}

impl BanStorage {
    pub fn new(db: Database, ttl: Duration) -> Self {
        Self {
            db,
            ttl,
            cache: DashMap::new(),
        }
    }

    /// Every recorded ban for `user` within the given communities.
    ///
    /// Community ids absent from the store (left communities, stale
    /// callers) are silently skipped.
    pub async fn bans_for(
        &self,
        user: UserId,
        communities: &[CommunityId],
    ) -> Result<Vec<BanRecord>, DbError> {
        let records = self.records_for(user).await?;
        Ok(records
            .into_iter()
            .filter(|r| communities.contains(&r.community_id))
            .collect())
    }

    /// Drop the cached entry for a user, forcing a re-read on next query.
    pub fn invalidate(&self, user: UserId) {
        self.cache.remove(&user);
    }

    async fn records_for(&self, user: UserId) -> Result<Vec<BanRecord>, DbError> {
        if let Some(entry) = self.cache.get(&user)
            && entry.fetched_at.elapsed() < self.ttl
        {
            return Ok(entry.records.clone());
        }

        let records = self.db.bans().bans_of(user).await?;
        debug!(user = %user, count = records.len(), "Refreshed ban cache entry");
        self.cache.insert(
            user,
            CachedBans {
                records: records.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_filters_to_requested_communities() {
        let db = Database::new(":memory:").await.unwrap();
        db.bans()
            .record(CommunityId(1), UserId(9), Some("spam"))
            .await
            .unwrap();
        db.bans()
            .record(CommunityId(2), UserId(9), None)
            .await
            .unwrap();

        let storage = BanStorage::new(db, Duration::from_secs(300));

        let bans = storage
            .bans_for(UserId(9), &[CommunityId(1)])
            .await
            .unwrap();
        assert_eq!(bans.len(), 1);
        assert_eq!(bans[0].community_id, CommunityId(1));

        // Communities the deployment no longer serves yield empty, not an error.
        let bans = storage
            .bans_for(UserId(9), &[CommunityId(999)])
            .await
            .unwrap();
        assert!(bans.is_empty());
    }

    #[tokio::test]
    async fn test_cache_serves_stale_until_invalidated() {
        let db = Database::new(":memory:").await.unwrap();
        db.bans()
            .record(CommunityId(1), UserId(9), Some("spam"))
            .await
            .unwrap();

        let storage = BanStorage::new(db.clone(), Duration::from_secs(300));
        let first = storage
            .bans_for(UserId(9), &[CommunityId(1)])
            .await
            .unwrap();
        assert_eq!(first.len(), 1);

        // The ban is lifted but the cache still holds the old snapshot.
        db.bans().remove(CommunityId(1), UserId(9)).await.unwrap();
        let cached = storage
            .bans_for(UserId(9), &[CommunityId(1)])
            .await
            .unwrap();
        assert_eq!(cached.len(), 1);

        storage.invalidate(UserId(9));
        let fresh = storage
            .bans_for(UserId(9), &[CommunityId(1)])
            .await
            .unwrap();
        assert!(fresh.is_empty());
    }
}
