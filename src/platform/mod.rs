//! Platform collaborator boundary.
//!
//! The engine never talks to a chat platform directly; everything it needs
//! (member snapshots, membership pages, the platform ban list, role and
//! moderation operations, modlog publishing) comes through the
//! [`ChatGateway`] trait. Event delivery, command parsing, and connection
//! management live entirely on the other side of this boundary.

mod types;

pub use types::{
    CommunityBan, CommunityId, CommunityInfo, Member, MessageId, PlatformFlags, Permissions,
    RoleId, UserId,
};

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by the platform collaborator.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The platform refused the action for lack of permission.
    #[error("missing permission: {0}")]
    PermissionDenied(&'static str),

    #[error("unknown community: {0}")]
    UnknownCommunity(CommunityId),

    #[error("unknown user: {0}")]
    UnknownUser(UserId),

    /// Transport-level failure talking to the platform.
    #[error("platform error: {0}")]
    Platform(String),
}

impl GatewayError {
    /// Static error code for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "permission_denied",
            Self::UnknownCommunity(_) => "unknown_community",
            Self::UnknownUser(_) => "unknown_user",
            Self::Platform(_) => "platform_error",
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}

/// Everything the engine consumes from the chat platform.
///
/// Implementations are expected to be cheap to clone behind an `Arc` and
/// safe for concurrent use; the engine issues calls from independent
/// evaluation tasks.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// The deployment's own account id.
    fn self_user(&self) -> UserId;

    /// Directory entry for one community.
    async fn community(&self, community: CommunityId) -> Result<CommunityInfo, GatewayError>;

    /// Every community this deployment currently serves.
    async fn communities(&self) -> Result<Vec<CommunityInfo>, GatewayError>;

    /// Fetch a single member; `Ok(None)` when the user is not (or no
    /// longer) a member of the community.
    async fn fetch_member(
        &self,
        community: CommunityId,
        user: UserId,
    ) -> Result<Option<Member>, GatewayError>;

    /// The community's member snapshot as currently cached by the
    /// platform client. May lag behind the live membership; used for
    /// name-proximity checks, not for destructive operations.
    async fn members(&self, community: CommunityId) -> Result<Vec<Member>, GatewayError>;

    /// One page of the community's membership, ordered by ascending user
    /// id, starting strictly after `after`. Returns fewer than `limit`
    /// entries (possibly zero) at the end of the membership.
    async fn members_after(
        &self,
        community: CommunityId,
        after: Option<UserId>,
        limit: usize,
    ) -> Result<Vec<Member>, GatewayError>;

    /// The community's current ban list. Requires ban-list-read
    /// permission on the platform side.
    async fn community_bans(
        &self,
        community: CommunityId,
    ) -> Result<Vec<CommunityBan>, GatewayError>;

    /// Permissions the deployment's own account holds in the community.
    async fn self_permissions(&self, community: CommunityId)
    -> Result<Permissions, GatewayError>;

    /// Permissions a member holds in the community.
    async fn member_permissions(
        &self,
        community: CommunityId,
        user: UserId,
    ) -> Result<Permissions, GatewayError>;

    async fn add_role(
        &self,
        community: CommunityId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), GatewayError>;

    async fn kick(
        &self,
        community: CommunityId,
        user: UserId,
        reason: &str,
    ) -> Result<(), GatewayError>;

    async fn ban(
        &self,
        community: CommunityId,
        user: UserId,
        reason: &str,
    ) -> Result<(), GatewayError>;

    /// Direct-message a user. Callers treat failure as non-fatal; users
    /// may have DMs disabled.
    async fn send_dm(&self, user: UserId, content: &str) -> Result<(), GatewayError>;

    /// Publish to the community's modlog channel. When `marker` is set,
    /// the message carries a user-identity marker that
    /// [`ChatGateway::modlog_marker`] can later resolve.
    async fn publish_modlog(
        &self,
        community: CommunityId,
        content: &str,
        marker: Option<UserId>,
    ) -> Result<MessageId, GatewayError>;

    /// Resolve the identity marker attached to a previously published
    /// modlog message, if any.
    async fn modlog_marker(
        &self,
        community: CommunityId,
        message: MessageId,
    ) -> Result<Option<UserId>, GatewayError>;

    /// Best-effort notice to the deployment operator's channel.
    async fn notify_operator(&self, content: &str) -> Result<(), GatewayError>;
}
