//! Audit messages and moderator overrides.
//!
//! Every evaluation publishes a verdict message to the community's
//! modlog channel, carrying the target's identity as a retrievable
//! marker. Moderators react to that message to override the machine's
//! verdict: approve, kick, or ban. Each reaction fires independently -
//! repeated or contradictory reactions are not deduplicated.

use crate::config::ValidationPolicy;
use crate::error::EngineError;
use crate::platform::{ChatGateway, CommunityId, Member, MessageId, UserId};
use crate::validation::ValidationContext;
use tracing::{debug, info, warn};

/// Reaction emoji recognized as override signals.
pub const APPROVE_REACTION: &str = "\u{2705}";
pub const KICK_REACTION: &str = "\u{274C}";
pub const BAN_REACTION: &str = "\u{2620}";

/// A moderator's override decision, decoded from a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideSignal {
    Approve,
    Kick,
    Ban,
}

impl OverrideSignal {
    /// Decode a reaction emoji; unrecognized reactions are not signals.
    pub fn from_reaction(emoji: &str) -> Option<Self> {
        match emoji {
            APPROVE_REACTION => Some(Self::Approve),
            KICK_REACTION => Some(Self::Kick),
            BAN_REACTION => Some(Self::Ban),
            _ => None,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Approve => APPROVE_REACTION,
            Self::Kick => KICK_REACTION,
            Self::Ban => BAN_REACTION,
        }
    }

    fn action_name(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Kick => "kick",
            Self::Ban => "ban",
        }
    }
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Compose the verdict message for one finished evaluation.
pub(crate) fn compose_verdict(ctx: &ValidationContext) -> String {
    let member = &ctx.member;
    let mut message = if ctx.approved {
        format!("Verified user: {} ({}).", member.username, member.id)
    } else {
        format!(
            "Moderators: user {} ({}) requires manual verification.",
            member.username, member.id
        )
    };

    if !ctx.approval_reasons.is_empty() {
        message.push_str(&format!(
            "\nApproved for the following reasons:\n```\n{}\n```",
            bullet_list(&ctx.approval_reasons)
        ));
    }
    if !ctx.rejection_reasons.is_empty() {
        message.push_str(&format!(
            "\nRejected for the following reasons:\n```\n{}\n```",
            bullet_list(&ctx.rejection_reasons)
        ));
    }
    message
}

/// Publish the verdict to the community's modlog with the target's
/// identity attached as a marker. Best-effort: a community without a
/// modlog channel loses the message, not the verdict.
pub(crate) async fn publish_verdict(
    gateway: &dyn ChatGateway,
    ctx: &ValidationContext,
) -> Option<MessageId> {
    let content = compose_verdict(ctx);
    match gateway
        .publish_modlog(ctx.member.community_id, &content, Some(ctx.member.id))
        .await
    {
        Ok(message) => Some(message),
        Err(e) => {
            warn!(
                community = %ctx.member.community_id,
                error = %e,
                "Failed to publish verdict to modlog"
            );
            None
        }
    }
}

fn moderator_name(member: Option<&Member>, id: UserId) -> String {
    member
        .map(|m| m.username.clone())
        .unwrap_or_else(|| id.to_string())
}

/// Handle one override reaction on an audit message.
///
/// The target id comes from the audit message's identity marker. The
/// signal is dropped when the target is no longer resolvable or the
/// reactor is the deployment itself; it is silently ignored when the
/// reactor lacks the permission the action requires. Permission failures
/// of the deployment's own account produce a modlog note instead of an
/// error.
pub(crate) async fn handle_override(
    gateway: &dyn ChatGateway,
    community: CommunityId,
    reactor: UserId,
    target: UserId,
    signal: OverrideSignal,
    policy: &ValidationPolicy,
) -> Result<(), EngineError> {
    if reactor == gateway.self_user() {
        return Ok(());
    }

    let Some(target_member) = gateway.fetch_member(community, target).await? else {
        debug!(target = %target, "Override target not resolvable; dropping signal");
        return Ok(());
    };

    let permissions = gateway.member_permissions(community, reactor).await?;
    let authorized = match signal {
        OverrideSignal::Approve => permissions.manage_roles,
        OverrideSignal::Kick => permissions.kick_members,
        OverrideSignal::Ban => permissions.ban_members,
    };
    if !authorized {
        debug!(reactor = %reactor, action = signal.action_name(), "Unauthorized override reaction ignored");
        return Ok(());
    }

    let reactor_member = gateway.fetch_member(community, reactor).await?;
    let reactor_name = moderator_name(reactor_member.as_ref(), reactor);
    let emoji = signal.emoji();

    match signal {
        OverrideSignal::Approve => {
            let note = match grant_trust_role(gateway, community, &target_member, policy).await {
                Ok(()) => {
                    info!(target = %target, reactor = %reactor, "Manually verified via reaction");
                    format!(
                        "{emoji} **{reactor_name}** manually verified **{}** via reaction.",
                        target_member.username
                    )
                }
                Err(e) if e.is_permission_denied() => format!(
                    "{emoji} Attempted to verify {} and failed. Missing role-management permission.",
                    target_member.username
                ),
                Err(e) => return Err(e.into()),
            };
            let _ = gateway.publish_modlog(community, &note, None).await;
        }
        OverrideSignal::Kick => {
            let reason = format!("Failed verification. Manually kicked by {reactor_name}.");
            let note = match gateway.kick(community, target, &reason).await {
                Ok(()) => {
                    info!(target = %target, reactor = %reactor, "Manually kicked via reaction");
                    format!(
                        "{emoji} **{reactor_name}** kicked **{}** via reaction during manual verification.",
                        target_member.username
                    )
                }
                Err(e) if e.is_permission_denied() => format!(
                    "{emoji} Attempted to kick {} and failed. Missing kick permission.",
                    target_member.username
                ),
                Err(e) => return Err(e.into()),
            };
            let _ = gateway.publish_modlog(community, &note, None).await;
        }
        OverrideSignal::Ban => {
            let reason = format!("Failed verification. Manually banned by {reactor_name}.");
            let note = match gateway.ban(community, target, &reason).await {
                Ok(()) => {
                    info!(target = %target, reactor = %reactor, "Manually banned via reaction");
                    format!(
                        "{emoji} **{reactor_name}** banned **{}** via reaction during manual verification.",
                        target_member.username
                    )
                }
                Err(e) if e.is_permission_denied() => format!(
                    "{emoji} Attempted to ban {} and failed. Missing ban permission.",
                    target_member.username
                ),
                Err(e) => return Err(e.into()),
            };
            let _ = gateway.publish_modlog(community, &note, None).await;
        }
    }

    crate::metrics::record_override_action(signal.action_name());
    Ok(())
}

async fn grant_trust_role(
    gateway: &dyn ChatGateway,
    community: CommunityId,
    target: &Member,
    policy: &ValidationPolicy,
) -> Result<(), crate::platform::GatewayError> {
    let Some(role) = policy.role_id else {
        return Ok(());
    };
    if target.has_role(role) {
        return Ok(());
    }
    gateway.add_role(community, target.id, role).await
}

/// A ban observed in one community, reported to the others.
#[derive(Debug, Clone)]
pub struct BanNotice {
    pub user: UserId,
    pub username: String,
    pub reason: Option<String>,
}

/// Notify the modlog of every other community where the banned user is
/// currently a member. Best-effort per community.
pub(crate) async fn report_ban(
    gateway: &dyn ChatGateway,
    notice: &BanNotice,
) -> Result<(), EngineError> {
    let contents = match &notice.reason {
        Some(reason) => format!(
            "User {} ({}) has been banned from another community for the \
             following reason: `{reason}`.",
            notice.username, notice.user
        ),
        None => format!(
            "User {} ({}) has been banned from another community.",
            notice.username, notice.user
        ),
    };

    for community in gateway.communities().await? {
        match gateway.fetch_member(community.id, notice.user).await {
            Ok(Some(_)) => {
                if let Err(e) = gateway.publish_modlog(community.id, &contents, None).await {
                    debug!(community = %community.id, error = %e, "Ban notice publish failed");
                }
            }
            Ok(None) => {}
            Err(e) => {
                debug!(community = %community.id, error = %e, "Ban notice member lookup failed");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationPolicy;
    use crate::platform::{CommunityId, PlatformFlags, UserId};
    use chrono::Utc;

    #[test]
    fn test_signal_decoding() {
        assert_eq!(
            OverrideSignal::from_reaction("\u{2705}"),
            Some(OverrideSignal::Approve)
        );
        assert_eq!(
            OverrideSignal::from_reaction("\u{274C}"),
            Some(OverrideSignal::Kick)
        );
        assert_eq!(
            OverrideSignal::from_reaction("\u{2620}"),
            Some(OverrideSignal::Ban)
        );
        assert_eq!(OverrideSignal::from_reaction("👍"), None);
    }

    #[test]
    fn test_compose_verdict_keeps_both_trails() {
        let member = Member {
            id: UserId(5),
            community_id: CommunityId(1),
            username: "newcomer".into(),
            discriminator: None,
            nickname: None,
            avatar: None,
            bot: false,
            moderator: false,
            premium: false,
            flags: PlatformFlags::default(),
            created_at: Utc::now(),
            joined_at: Utc::now(),
            booster_since: None,
            roles: Vec::new(),
        };
        let mut ctx = ValidationContext::new(member, ValidationPolicy::default());
        ctx.add_rejection_reason("Account created less than 30 days ago.");
        ctx.add_approval_reason("User has a premium subscription.");

        let message = compose_verdict(&ctx);
        assert!(message.starts_with("Verified user: newcomer (5)."));
        assert!(message.contains("Approved for the following reasons:"));
        assert!(message.contains("Rejected for the following reasons:"));
        assert!(message.contains("- Account created less than 30 days ago."));
    }
}
