//! Core identity and snapshot types shared with the platform collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

id_type!(
    /// Platform-wide user id.
    UserId
);
id_type!(
    /// Id of one community (server/guild) served by the deployment.
    CommunityId
);
id_type!(
    /// Community-local role id.
    RoleId
);
id_type!(
    /// Id of a published message.
    MessageId
);

/// Platform-level "distinguished" account flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformFlags {
    /// Account belongs to platform staff.
    pub staff: bool,
    /// Account owns a partnered community.
    pub partner: bool,
    /// Account is a verified developer.
    pub verified_developer: bool,
}

impl PlatformFlags {
    /// True if any distinguished flag is set.
    pub fn any(&self) -> bool {
        self.staff || self.partner || self.verified_developer
    }
}

/// Permission bits the engine cares about, resolved for one user in one
/// community.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions {
    pub manage_roles: bool,
    pub kick_members: bool,
    pub ban_members: bool,
}

/// A user as seen within one community: platform identity plus
/// community-local attributes.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: UserId,
    pub community_id: CommunityId,
    /// Platform-wide username.
    pub username: String,
    /// Legacy numeric discriminator, if the platform still assigns one.
    pub discriminator: Option<u16>,
    /// Community-local nickname, if set.
    pub nickname: Option<String>,
    /// Avatar image hash; `None` when no avatar is set.
    pub avatar: Option<String>,
    /// Account is a bot.
    pub bot: bool,
    /// Member holds a moderation role in this community.
    pub moderator: bool,
    /// Account has a paid premium subscription.
    pub premium: bool,
    pub flags: PlatformFlags,
    /// When the account was created platform-wide.
    pub created_at: DateTime<Utc>,
    /// When the member joined this community.
    pub joined_at: DateTime<Utc>,
    /// Set while the member is boosting the community.
    pub booster_since: Option<DateTime<Utc>>,
    /// Roles currently held in this community.
    pub roles: Vec<RoleId>,
}

impl Member {
    /// The name shown in the community: nickname when set, username otherwise.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.username)
    }

    pub fn has_role(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }
}

/// Directory entry for one community served by the deployment.
#[derive(Debug, Clone)]
pub struct CommunityInfo {
    pub id: CommunityId,
    pub name: String,
    pub member_count: u64,
}

/// One entry of a community's current ban list, as read from the platform.
#[derive(Debug, Clone)]
pub struct CommunityBan {
    pub user_id: UserId,
    /// Username of the banned account at ban time.
    pub username: String,
    /// Avatar hash of the banned account, if it had one.
    pub avatar: Option<String>,
    pub reason: Option<String>,
}
