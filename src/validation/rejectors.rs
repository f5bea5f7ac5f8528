//! Rejecting validators.
//!
//! Ordered roughly by confidence: suspicion-level checks (new accounts,
//! missing avatars, name filters) produce false positives by design and
//! run early so later approvers can overturn them; malice-level checks
//! (cross-community bans, banned-name matches, lockdown) run late.

use super::context::ValidationContext;
use super::normalize;
use super::{RuleError, Services};
use crate::platform::Member;
use chrono::{Duration, Utc};
use regex::Regex;
use std::collections::HashSet;

/// Rejects accounts created within the lookback window. Alts of banned
/// users are commonly fresh accounts.
#[derive(Debug)]
pub struct NewAccountRejector {
    lookback: Duration,
}

impl NewAccountRejector {
    pub fn new(lookback: Duration) -> Self {
        Self { lookback }
    }

    pub(super) async fn evaluate(
        &self,
        _services: &Services<'_>,
        ctx: &mut ValidationContext,
    ) -> Result<(), RuleError> {
        if ctx.member.created_at > Utc::now() - self.lookback {
            ctx.add_rejection_reason(format!(
                "Account created less than {} ago.",
                normalize::humanize_duration(self.lookback)
            ));
        }
        Ok(())
    }
}

/// Rejects accounts with no avatar set. Low-effort user bots and alt
/// accounts tend not to bother.
#[derive(Debug)]
pub struct NoAvatarRejector;

impl NoAvatarRejector {
    pub(super) async fn evaluate(
        &self,
        _services: &Services<'_>,
        ctx: &mut ValidationContext,
    ) -> Result<(), RuleError> {
        if ctx.member.avatar.is_none() {
            ctx.add_rejection_reason("User has no avatar.");
        }
        Ok(())
    }
}

/// Rejects deleted accounts and accounts faking deletion.
///
/// Deleted accounts cannot join communities, so a joining user that
/// carries the platform's deletion naming is suspicious by itself; a
/// name that merely resembles the deletion pattern, or a deletion-style
/// name with an improbably low discriminator, points at a faked
/// deletion.
#[derive(Debug)]
pub struct DeletedAccountRejector;

impl DeletedAccountRejector {
    pub(super) async fn evaluate(
        &self,
        services: &Services<'_>,
        ctx: &mut ValidationContext,
    ) -> Result<(), RuleError> {
        if normalize::is_deletion_pattern(&ctx.member.username) {
            ctx.add_rejection_reason(
                "Deleted accounts cannot be active. User has been deleted by the \
                 platform of their own accord or for Trust and Safety reasons, or \
                 is faking account deletion.",
            );
            if let Some(discriminator) = ctx.member.discriminator
                && discriminator < 100
            {
                ctx.add_rejection_reason(format!(
                    "\"{}#{:04}\" has an unusual discriminator. These are randomly \
                     generated. User may have attempted to fake account deletion.",
                    ctx.member.username, discriminator
                ));
            }
        }

        for name in ctx.usernames(services.db).await? {
            if normalize::resembles_deletion(&name) && !normalize::is_deletion_pattern(&name) {
                ctx.add_rejection_reason(format!(
                    "\"{name}\" does not match the platform's deletion patterns. \
                     User may have attempted to fake account deletion.",
                ));
            }
        }
        Ok(())
    }
}

/// Which value of the evaluated user a string filter inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSource {
    /// Every known username, current and historical.
    Usernames,
    /// The community-local display name only.
    DisplayName,
}

/// Rejects users whose names match a configured filter list.
///
/// Each filter string is compiled once into a permissive pattern; tested
/// values are checked both raw and with look-alike characters folded.
#[derive(Debug)]
pub struct StringFilterRejector {
    prefix: String,
    filters: Vec<(String, Regex)>,
    source: FilterSource,
}

impl StringFilterRejector {
    pub fn new(prefix: impl Into<String>, filters: &[String], full_match: bool) -> Self {
        Self {
            prefix: prefix.into(),
            filters: filters
                .iter()
                .filter_map(|f| {
                    normalize::permissive_pattern(f, full_match).map(|re| (f.clone(), re))
                })
                .collect(),
            source: FilterSource::Usernames,
        }
    }

    pub fn with_source(mut self, source: FilterSource) -> Self {
        self.source = source;
        self
    }

    /// Original filter strings that match the value, raw or folded.
    fn matching_filters(&self, value: &str) -> Vec<&str> {
        let folded = normalize::fold_lookalikes(value);
        self.filters
            .iter()
            .filter(|(_, re)| re.is_match(value) || re.is_match(&folded))
            .map(|(raw, _)| raw.as_str())
            .collect()
    }

    pub(super) async fn evaluate(
        &self,
        services: &Services<'_>,
        ctx: &mut ValidationContext,
    ) -> Result<(), RuleError> {
        let values = match self.source {
            FilterSource::Usernames => ctx.usernames(services.db).await?,
            FilterSource::DisplayName => vec![ctx.member.display_name().to_string()],
        };
        for value in &values {
            for filter in self.matching_filters(value) {
                ctx.add_rejection_reason(format!("{}Matches: `{}`", self.prefix, filter));
            }
        }
        Ok(())
    }
}

/// Which community members seed a name-proximity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberPredicate {
    Moderator,
    Bot,
}

impl MemberPredicate {
    fn matches(&self, member: &Member) -> bool {
        match self {
            Self::Moderator => member.moderator,
            Self::Bot => member.bot,
        }
    }
}

/// Which name of a seed member contributes candidate tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    Username,
    Nickname,
}

/// Rejects users whose username sits too close to an existing member's:
/// impersonation of moderators and bots.
///
/// Candidate tokens are harvested from the selected name of every member
/// matching the predicate, split on camel-case and word boundaries;
/// tokens shorter than `min_match_length` carry too little signal and
/// are discarded.
#[derive(Debug)]
pub struct NameMatchRejector {
    prefix: String,
    predicate: MemberPredicate,
    field: NameField,
    min_match_length: usize,
}

impl NameMatchRejector {
    pub fn new(
        prefix: impl Into<String>,
        predicate: MemberPredicate,
        field: NameField,
        min_match_length: usize,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            predicate,
            field,
            min_match_length,
        }
    }

    fn candidate_tokens(&self, members: &[Member]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut tokens = Vec::new();
        for member in members.iter().filter(|m| self.predicate.matches(m)) {
            let name = match self.field {
                NameField::Username => Some(member.username.as_str()),
                NameField::Nickname => member.nickname.as_deref(),
            };
            let Some(name) = name else { continue };
            for token in normalize::name_tokens(name) {
                if token.chars().count() >= self.min_match_length && seen.insert(token.clone()) {
                    tokens.push(token);
                }
            }
        }
        tokens
    }

    pub(super) async fn evaluate(
        &self,
        services: &Services<'_>,
        ctx: &mut ValidationContext,
    ) -> Result<(), RuleError> {
        let members = services.gateway.members(ctx.member.community_id).await?;
        let username = ctx.member.username.clone();
        for token in self.candidate_tokens(&members) {
            let Some(pattern) = normalize::permissive_pattern(&token, false) else {
                continue;
            };
            if pattern.is_match(&username) {
                ctx.add_rejection_reason(format!("{}Matches: `{}`", self.prefix, token));
            }
        }
        Ok(())
    }
}

/// Rejects users banned in other communities served by this deployment.
///
/// Only communities at or above the size threshold count; tiny
/// communities ban too casually to be a malice signal.
#[derive(Debug)]
pub struct BannedUserRejector {
    min_community_size: u64,
}

impl BannedUserRejector {
    pub fn new(min_community_size: u64) -> Self {
        Self { min_community_size }
    }

    pub(super) async fn evaluate(
        &self,
        services: &Services<'_>,
        ctx: &mut ValidationContext,
    ) -> Result<(), RuleError> {
        let communities = services.gateway.communities().await?;
        // Size re-checked at read time: membership counts drift, and a
        // community below threshold must not contribute even if a stale
        // caller passed it in.
        let eligible: Vec<_> = communities
            .iter()
            .filter(|c| c.member_count >= self.min_community_size)
            .map(|c| c.id)
            .collect();

        let bans = services.bans.bans_for(ctx.member.id, &eligible).await?;

        let mut banned = false;
        let mut seen_reasons = HashSet::new();
        for ban in &bans {
            banned = true;
            if let Some(reason) = ban.reason.as_deref().filter(|r| !r.is_empty())
                && seen_reasons.insert(reason.to_string())
            {
                ctx.add_rejection_reason(format!(
                    "Banned on another community. Reason: `{reason}`."
                ));
            }
        }
        if banned && seen_reasons.is_empty() {
            ctx.add_rejection_reason("Banned on another community.");
        }
        Ok(())
    }
}

/// Rejects users sharing an exact (normalized) username or avatar with a
/// user currently banned in this community.
///
/// Requires the deployment to be able to read the community's ban list;
/// without that permission this rule is a no-op.
#[derive(Debug)]
pub struct BannedUsernameRejector;

impl BannedUsernameRejector {
    pub(super) async fn evaluate(
        &self,
        services: &Services<'_>,
        ctx: &mut ValidationContext,
    ) -> Result<(), RuleError> {
        let community = ctx.member.community_id;
        let permissions = services.gateway.self_permissions(community).await?;
        if !permissions.ban_members {
            return Ok(());
        }

        let bans = services.gateway.community_bans(community).await?;
        if bans.is_empty() {
            return Ok(());
        }

        let normalized_bans: Vec<(String, &crate::platform::CommunityBan)> = bans
            .iter()
            .map(|b| (normalize::normalize_name(&b.username), b))
            .collect();

        for name in ctx.usernames(services.db).await? {
            let folded = normalize::fold_lookalikes(&name);
            let matched = [name.as_str(), folded.as_str()]
                .into_iter()
                .find_map(|candidate| {
                    let normalized = normalize::normalize_name(candidate);
                    normalized_bans
                        .iter()
                        .find(|(n, _)| *n == normalized)
                        .map(|(_, ban)| *ban)
                });
            if let Some(ban) = matched {
                let mut reason =
                    format!("Exact username match with banned user: `{}`.", ban.username);
                if let Some(ban_reason) = &ban.reason {
                    reason.push_str(&format!(" Ban reason: {ban_reason}"));
                }
                ctx.add_rejection_reason(reason);
            }
        }

        if let Some(avatar) = ctx.member.avatar.clone() {
            for ban in &bans {
                if ban.avatar.as_deref() == Some(avatar.as_str()) {
                    let mut reason =
                        format!("Exact avatar match with banned user: `{}`.", ban.username);
                    if let Some(ban_reason) = &ban.reason {
                        reason.push_str(&format!(" Ban reason: {ban_reason}"));
                    }
                    ctx.add_rejection_reason(reason);
                }
            }
        }
        Ok(())
    }
}

/// Rejects everyone while the community is locked down.
#[derive(Debug)]
pub struct LockdownRejector;

impl LockdownRejector {
    pub(super) async fn evaluate(
        &self,
        services: &Services<'_>,
        ctx: &mut ValidationContext,
    ) -> Result<(), RuleError> {
        if services.lockdowns.is_active(ctx.member.community_id) {
            ctx.add_rejection_reason(
                "Lockdown enabled. All new joins must be manually verified.",
            );
        }
        Ok(())
    }
}
