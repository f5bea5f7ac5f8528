//! Bulk removal of stale unverified members.
//!
//! Two-phase protocol: `scan` walks the membership and counts kickable
//! members without touching anything; `execute` performs the removals.
//! The command surface is expected to show the scan count to an operator
//! and get explicit confirmation before calling `execute` - the two-call
//! shape is this module's contract, the prompting is not.
//!
//! Membership is streamed in pages, never materialized whole. Kicks are
//! dispatched in small concurrent batches with a full barrier between
//! batches; the batch size is backpressure against platform rate limits,
//! not a performance knob.

use crate::config::PurgeConfig;
use crate::error::EngineError;
use crate::platform::{ChatGateway, CommunityId, Member, RoleId};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Audit reason attached to every purge kick.
const PURGE_KICK_REASON: &str = "Unverified in sufficient time.";

/// A member is kickable when it lacks the trust role, joined before the
/// cutoff, is not a bot, and is not boosting the community.
fn is_kickable(member: &Member, trust_role: RoleId, cutoff: DateTime<Utc>) -> bool {
    !member.has_role(trust_role)
        && member.joined_at < cutoff
        && !member.bot
        && member.booster_since.is_none()
}

/// The paginated scan/kick job.
pub struct PurgeJob<'a> {
    gateway: &'a dyn ChatGateway,
    config: &'a PurgeConfig,
    cancel: CancellationToken,
}

impl<'a> PurgeJob<'a> {
    pub fn new(gateway: &'a dyn ChatGateway, config: &'a PurgeConfig) -> Self {
        Self {
            gateway,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Make the job interruptible: cancellation is honored between
    /// membership pages.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Dry run: count kickable members without mutating membership.
    pub async fn scan(
        &self,
        community: CommunityId,
        trust_role: RoleId,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, EngineError> {
        self.run(community, trust_role, cutoff, true).await
    }

    /// Destructive run: DM and kick every kickable member, returning the
    /// number actually removed.
    pub async fn execute(
        &self,
        community: CommunityId,
        trust_role: RoleId,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, EngineError> {
        self.run(community, trust_role, cutoff, false).await
    }

    async fn run(
        &self,
        community: CommunityId,
        trust_role: RoleId,
        cutoff: DateTime<Utc>,
        dry_run: bool,
    ) -> Result<u64, EngineError> {
        let info = self.gateway.community(community).await?;
        let mut found = 0u64;
        let mut removed = 0u64;
        let mut batch = Vec::new();
        let mut after = None;

        loop {
            if self.cancel.is_cancelled() {
                info!(community = %community, "Purge interrupted by caller");
                break;
            }
            let page = self
                .gateway
                .members_after(community, after, self.config.page_size)
                .await?;
            let Some(last) = page.last() else { break };
            after = Some(last.id);
            let page_len = page.len();

            for member in page {
                if !is_kickable(&member, trust_role, cutoff) {
                    continue;
                }
                found += 1;
                if dry_run {
                    continue;
                }
                batch.push(self.kick_one(community, member, &info.name));
                if batch.len() >= self.config.batch_size.max(1) {
                    // Barrier: the whole batch lands before the next one
                    // starts, so a failing kick cannot strand the rest.
                    let results = join_all(std::mem::take(&mut batch)).await;
                    removed += results.into_iter().filter(|kicked| *kicked).count() as u64;
                }
            }

            if page_len < self.config.page_size {
                break;
            }
        }

        if !batch.is_empty() {
            let results = join_all(batch).await;
            removed += results.into_iter().filter(|kicked| *kicked).count() as u64;
        }

        if dry_run {
            info!(community = %community, count = found, "Purge scan complete");
            Ok(found)
        } else {
            info!(community = %community, count = removed, "Purge complete");
            Ok(removed)
        }
    }

    async fn kick_one(&self, community: CommunityId, member: Member, community_name: &str) -> bool {
        // Best-effort notice; the user may have DMs disabled.
        let notice = self.config.dm_template.replace("{}", community_name);
        if let Err(e) = self.gateway.send_dm(member.id, &notice).await {
            debug!(user = %member.id, error = %e, "Purge notice DM failed");
        }

        match self
            .gateway
            .kick(community, member.id, PURGE_KICK_REASON)
            .await
        {
            Ok(()) => {
                crate::metrics::record_purge_kick();
                info!(user = %member.id, community = %community, "Purged unverified member");
                true
            }
            Err(e) => {
                warn!(user = %member.id, community = %community, error = %e, "Purge kick failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{PlatformFlags, UserId};
    use chrono::Duration;

    fn member(id: u64) -> Member {
        Member {
            id: UserId(id),
            community_id: CommunityId(1),
            username: format!("user{id}"),
            discriminator: None,
            nickname: None,
            avatar: None,
            bot: false,
            moderator: false,
            premium: false,
            flags: PlatformFlags::default(),
            created_at: Utc::now() - Duration::days(365),
            joined_at: Utc::now() - Duration::days(7),
            booster_since: None,
            roles: Vec::new(),
        }
    }

    #[test]
    fn test_kickable_predicate() {
        let trust_role = RoleId(10);
        let cutoff = Utc::now() - Duration::hours(6);

        let mut trusted = member(1);
        trusted.roles.push(trust_role);

        let mut bot = member(2);
        bot.bot = true;

        let mut booster = member(3);
        booster.booster_since = Some(Utc::now() - Duration::days(2));

        let stale = member(4);

        let mut fresh = member(5);
        fresh.joined_at = Utc::now() - Duration::hours(1);

        assert!(!is_kickable(&trusted, trust_role, cutoff));
        assert!(!is_kickable(&bot, trust_role, cutoff));
        assert!(!is_kickable(&booster, trust_role, cutoff));
        assert!(is_kickable(&stale, trust_role, cutoff));
        // Joined after the cutoff: still inside the grace window.
        assert!(!is_kickable(&fresh, trust_role, cutoff));
    }
}
