//! The engine façade: the only surface event/command handlers need.
//!
//! Owns the validator chain and the shared security state, and wires
//! evaluations end to end: run the chain, grant the trust role on
//! approval, publish the audit message. Independent evaluations may run
//! concurrently; all shared state lives in the concurrent caches.

use crate::config::{EngineConfig, ValidationPolicy};
use crate::db::Database;
use crate::error::{EngineError, EngineResult};
use crate::jobs::{PurgeJob, propagate_role};
use crate::modlog::{self, BanNotice, OverrideSignal};
use crate::platform::{ChatGateway, CommunityId, GatewayError, Member, UserId};
use crate::security::{BanStorage, LockdownController};
use crate::validation::{Chain, Services, ValidationContext, Verdict};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The admission-control engine.
pub struct ValidationEngine {
    config: EngineConfig,
    gateway: Arc<dyn ChatGateway>,
    db: Database,
    bans: BanStorage,
    lockdowns: LockdownController,
    chain: Chain,
}

impl ValidationEngine {
    /// Build the engine with the standard validator chain, restoring
    /// persisted lockdowns.
    pub async fn new(
        config: EngineConfig,
        gateway: Arc<dyn ChatGateway>,
        db: Database,
    ) -> EngineResult<Self> {
        let bans = BanStorage::new(db.clone(), Duration::from_secs(config.ban_cache_ttl_secs));
        let lockdowns = LockdownController::load(db.clone()).await?;
        let chain = Chain::standard(&config);
        info!(validators = chain.len(), "Validation engine ready");
        Ok(Self {
            config,
            gateway,
            db,
            bans,
            lockdowns,
            chain,
        })
    }

    fn services(&self) -> Services<'_> {
        Services {
            gateway: self.gateway.as_ref(),
            db: &self.db,
            bans: &self.bans,
            lockdowns: &self.lockdowns,
        }
    }

    /// Evaluate one member against the community's policy.
    ///
    /// Runs the full chain, grants the trust role on approval, and
    /// publishes the audit message. Returns the verdict with the
    /// complete reason trail.
    pub async fn evaluate(
        &self,
        member: Member,
        policy: &ValidationPolicy,
    ) -> EngineResult<Verdict> {
        if !policy.enabled {
            return Err(EngineError::NotConfigured(member.community_id));
        }

        let mut ctx = ValidationContext::new(member, policy.clone());
        let approved = self.chain.run(&self.services(), &mut ctx).await;
        crate::metrics::record_evaluation(approved);
        info!(
            user = %ctx.member.id,
            community = %ctx.member.community_id,
            approved,
            rejection_reasons = ctx.rejection_reasons.len(),
            "Evaluation complete"
        );

        if let Err(e) = ctx.apply_trust_role(self.gateway.as_ref()).await {
            warn!(user = %ctx.member.id, error = %e, "Trust role grant failed");
            if e.is_permission_denied() {
                let note = format!(
                    "Verified {} ({}) but could not grant the trust role. \
                     Missing role-management permission.",
                    ctx.member.username, ctx.member.id
                );
                let _ = self
                    .gateway
                    .publish_modlog(ctx.member.community_id, &note, None)
                    .await;
            }
        }

        modlog::publish_verdict(self.gateway.as_ref(), &ctx).await;
        Ok(ctx.verdict())
    }

    /// Force manual review of all joins in the community until
    /// `expires_at`.
    pub async fn activate_lockdown(
        &self,
        community: CommunityId,
        expires_at: DateTime<Utc>,
    ) -> EngineResult<()> {
        self.lockdowns.activate(community, expires_at).await?;
        Ok(())
    }

    /// Lift a lockdown before its expiry.
    pub async fn deactivate_lockdown(&self, community: CommunityId) -> EngineResult<()> {
        self.lockdowns.deactivate(community).await?;
        Ok(())
    }

    /// Whether the community is currently locked down.
    pub fn is_lockdown_active(&self, community: CommunityId) -> bool {
        self.lockdowns.is_active(community)
    }

    /// Count members the purge would remove, without removing anyone.
    pub async fn scan_purge(
        &self,
        community: CommunityId,
        policy: &ValidationPolicy,
        cutoff: DateTime<Utc>,
    ) -> EngineResult<u64> {
        let role = self.require_role(community, policy)?;
        PurgeJob::new(self.gateway.as_ref(), &self.config.purge)
            .scan(community, role, cutoff)
            .await
    }

    /// Remove every stale unverified member; returns the number removed.
    ///
    /// Callers are expected to have shown a `scan_purge` count to an
    /// operator and gotten confirmation first.
    pub async fn execute_purge(
        &self,
        community: CommunityId,
        policy: &ValidationPolicy,
        cutoff: DateTime<Utc>,
    ) -> EngineResult<u64> {
        let role = self.require_role(community, policy)?;
        let permissions = self.gateway.self_permissions(community).await?;
        if !permissions.kick_members {
            return Err(GatewayError::PermissionDenied("kick_members").into());
        }
        PurgeJob::new(self.gateway.as_ref(), &self.config.purge)
            .execute(community, role, cutoff)
            .await
    }

    /// Grant the trust role to every member missing it.
    pub async fn propagate_role(
        &self,
        community: CommunityId,
        policy: &ValidationPolicy,
    ) -> EngineResult<u64> {
        let role = self.require_role(community, policy)?;
        propagate_role(
            self.gateway.as_ref(),
            community,
            role,
            self.config.purge.page_size,
        )
        .await
    }

    /// Apply a moderator's override reaction to an audit message.
    pub async fn handle_override_reaction(
        &self,
        community: CommunityId,
        reactor: UserId,
        target: UserId,
        signal: OverrideSignal,
        policy: &ValidationPolicy,
    ) -> EngineResult<()> {
        modlog::handle_override(
            self.gateway.as_ref(),
            community,
            reactor,
            target,
            signal,
            policy,
        )
        .await
    }

    /// Report a ban observed in one community to every other community
    /// the user is a member of.
    pub async fn report_ban(&self, notice: &BanNotice) -> EngineResult<()> {
        self.bans.invalidate(notice.user);
        modlog::report_ban(self.gateway.as_ref(), notice).await
    }

    fn require_role(
        &self,
        community: CommunityId,
        policy: &ValidationPolicy,
    ) -> EngineResult<crate::platform::RoleId> {
        if !policy.enabled {
            return Err(EngineError::NotConfigured(community));
        }
        policy
            .role_id
            .ok_or(EngineError::NotConfigured(community))
    }
}
