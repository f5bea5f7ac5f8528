//! Per-community lockdown gate.
//!
//! A lockdown is a boolean-with-expiry: while active, every non-exempt
//! join is forced into manual review by the lockdown rejector. Expiry is
//! checked lazily at query time; no background timer runs.
//!
//! State is held in memory for fast reads and written through to the
//! lockdown repository, so an active lockdown survives a process restart.
//! Activation and lifting go through explicit operator commands;
//! last-write-wins is sufficient.

use crate::db::{Database, DbError};
use crate::platform::CommunityId;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info};

/// In-memory lockdown state with write-through persistence.
pub struct LockdownController {
    db: Database,
    /// Community id -> unix expiry timestamp.
    expiries: DashMap<CommunityId, i64>,
}

impl LockdownController {
    /// Load persisted lockdowns into memory.
    ///
    /// Called once at startup; already-expired rows are ignored.
    pub async fn load(db: Database) -> Result<Self, DbError> {
        let now = Utc::now().timestamp();
        let expiries = DashMap::new();
        for (community, expires_at) in db.lockdowns().all_active(now).await? {
            expiries.insert(community, expires_at);
        }
        if !expiries.is_empty() {
            info!(count = expiries.len(), "Restored active lockdowns");
        }
        Ok(Self { db, expiries })
    }

    /// Activate a lockdown until `expires_at`, replacing any existing one.
    pub async fn activate(
        &self,
        community: CommunityId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let ts = expires_at.timestamp();
        self.db.lockdowns().set(community, ts).await?;
        self.expiries.insert(community, ts);
        crate::metrics::set_lockdowns_active(self.active_count() as i64);
        info!(community = %community, expires_at = %expires_at, "Lockdown activated");
        Ok(())
    }

    /// Lift a community's lockdown.
    pub async fn deactivate(&self, community: CommunityId) -> Result<(), DbError> {
        self.db.lockdowns().clear(community).await?;
        self.expiries.remove(&community);
        crate::metrics::set_lockdowns_active(self.active_count() as i64);
        info!(community = %community, "Lockdown lifted");
        Ok(())
    }

    /// True iff a lockdown is stored and its expiry is in the future.
    ///
    /// An expired entry is dropped from memory here; the persisted row is
    /// cleaned up opportunistically on the next activate/deactivate.
    pub fn is_active(&self, community: CommunityId) -> bool {
        let now = Utc::now().timestamp();
        // Copy the expiry out so the map guard is released before any
        // removal below.
        let expires_at = match self.expiries.get(&community) {
            Some(entry) => *entry,
            None => return false,
        };
        if expires_at > now {
            true
        } else {
            self.expiries.remove(&community);
            debug!(community = %community, "Lockdown expired");
            false
        }
    }

    fn active_count(&self) -> usize {
        self.expiries.len()
    }
}
