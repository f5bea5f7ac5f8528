//! Shared test fixtures: an in-memory fake of the platform gateway and
//! member/policy builders.

#![allow(dead_code)] // Each integration test binary uses a subset.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use gatewarden::ValidationPolicy;
use gatewarden::platform::{
    ChatGateway, CommunityBan, CommunityId, CommunityInfo, GatewayError, Member, MessageId,
    Permissions, PlatformFlags, RoleId, UserId,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Initialize test logging once; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// A healthy, unremarkable member: old account, avatar set, no roles.
pub fn make_member(community: u64, id: u64, username: &str) -> Member {
    Member {
        id: UserId(id),
        community_id: CommunityId(community),
        username: username.to_string(),
        discriminator: None,
        nickname: None,
        avatar: Some(format!("avatar-{id}")),
        bot: false,
        moderator: false,
        premium: false,
        flags: PlatformFlags::default(),
        created_at: Utc::now() - Duration::days(730),
        joined_at: Utc::now() - Duration::days(7),
        booster_since: None,
        roles: Vec::new(),
    }
}

pub fn policy(role: u64) -> ValidationPolicy {
    ValidationPolicy {
        enabled: true,
        role_id: Some(RoleId(role)),
        kick_unverified_after_secs: Some(6 * 3600),
    }
}

#[derive(Default)]
struct State {
    communities: Vec<CommunityInfo>,
    members: HashMap<CommunityId, Vec<Member>>,
    bans: HashMap<CommunityId, Vec<CommunityBan>>,
    self_permissions: HashMap<CommunityId, Permissions>,
    member_permissions: HashMap<(CommunityId, UserId), Permissions>,
    dm_unreachable: HashSet<UserId>,
    fail_member_snapshot: bool,
    kicked: Vec<(CommunityId, UserId, String)>,
    banned: Vec<(CommunityId, UserId, String)>,
    role_grants: Vec<(CommunityId, UserId, RoleId)>,
    dms: Vec<(UserId, String)>,
    modlog: Vec<(MessageId, CommunityId, String, Option<UserId>)>,
    operator_notices: Vec<String>,
    next_message_id: u64,
}

/// In-memory platform double. Mutations (kick, ban, role grant) update
/// the member snapshot so follow-up reads observe them.
pub struct FakeGateway {
    self_user: UserId,
    state: Mutex<State>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            self_user: UserId(1),
            state: Mutex::new(State {
                next_message_id: 1,
                ..State::default()
            }),
        }
    }

    pub fn add_community(&self, id: u64, name: &str, member_count: u64) {
        let mut state = self.state.lock();
        state.communities.push(CommunityInfo {
            id: CommunityId(id),
            name: name.to_string(),
            member_count,
        });
        // Full permissions for the deployment itself unless a test says
        // otherwise.
        state.self_permissions.insert(
            CommunityId(id),
            Permissions {
                manage_roles: true,
                kick_members: true,
                ban_members: true,
            },
        );
    }

    pub fn add_member(&self, member: Member) {
        self.state
            .lock()
            .members
            .entry(member.community_id)
            .or_default()
            .push(member);
    }

    pub fn add_ban(&self, community: u64, ban: CommunityBan) {
        self.state
            .lock()
            .bans
            .entry(CommunityId(community))
            .or_default()
            .push(ban);
    }

    pub fn set_self_permissions(&self, community: u64, permissions: Permissions) {
        self.state
            .lock()
            .self_permissions
            .insert(CommunityId(community), permissions);
    }

    pub fn set_member_permissions(&self, community: u64, user: u64, permissions: Permissions) {
        self.state
            .lock()
            .member_permissions
            .insert((CommunityId(community), UserId(user)), permissions);
    }

    pub fn set_dm_unreachable(&self, user: u64) {
        self.state.lock().dm_unreachable.insert(UserId(user));
    }

    /// Make `members()` fail, to exercise validator fault isolation.
    pub fn fail_member_snapshot(&self) {
        self.state.lock().fail_member_snapshot = true;
    }

    pub fn kicked(&self) -> Vec<(CommunityId, UserId, String)> {
        self.state.lock().kicked.clone()
    }

    pub fn banned(&self) -> Vec<(CommunityId, UserId, String)> {
        self.state.lock().banned.clone()
    }

    pub fn role_grants(&self) -> Vec<(CommunityId, UserId, RoleId)> {
        self.state.lock().role_grants.clone()
    }

    pub fn dms(&self) -> Vec<(UserId, String)> {
        self.state.lock().dms.clone()
    }

    pub fn modlog(&self) -> Vec<(MessageId, CommunityId, String, Option<UserId>)> {
        self.state.lock().modlog.clone()
    }

    pub fn operator_notices(&self) -> Vec<String> {
        self.state.lock().operator_notices.clone()
    }

    fn permissions_or_denied(
        &self,
        community: CommunityId,
        required: fn(&Permissions) -> bool,
        label: &'static str,
    ) -> Result<(), GatewayError> {
        let state = self.state.lock();
        let permissions = state
            .self_permissions
            .get(&community)
            .copied()
            .unwrap_or_default();
        if required(&permissions) {
            Ok(())
        } else {
            Err(GatewayError::PermissionDenied(label))
        }
    }
}

#[async_trait]
impl ChatGateway for FakeGateway {
    fn self_user(&self) -> UserId {
        self.self_user
    }

    async fn community(&self, community: CommunityId) -> Result<CommunityInfo, GatewayError> {
        self.state
            .lock()
            .communities
            .iter()
            .find(|c| c.id == community)
            .cloned()
            .ok_or(GatewayError::UnknownCommunity(community))
    }

    async fn communities(&self) -> Result<Vec<CommunityInfo>, GatewayError> {
        Ok(self.state.lock().communities.clone())
    }

    async fn fetch_member(
        &self,
        community: CommunityId,
        user: UserId,
    ) -> Result<Option<Member>, GatewayError> {
        Ok(self
            .state
            .lock()
            .members
            .get(&community)
            .and_then(|members| members.iter().find(|m| m.id == user).cloned()))
    }

    async fn members(&self, community: CommunityId) -> Result<Vec<Member>, GatewayError> {
        let state = self.state.lock();
        if state.fail_member_snapshot {
            return Err(GatewayError::Platform("member snapshot unavailable".into()));
        }
        Ok(state.members.get(&community).cloned().unwrap_or_default())
    }

    async fn members_after(
        &self,
        community: CommunityId,
        after: Option<UserId>,
        limit: usize,
    ) -> Result<Vec<Member>, GatewayError> {
        let state = self.state.lock();
        let mut members = state.members.get(&community).cloned().unwrap_or_default();
        members.sort_by_key(|m| m.id);
        Ok(members
            .into_iter()
            .filter(|m| after.is_none_or(|a| m.id > a))
            .take(limit)
            .collect())
    }

    async fn community_bans(
        &self,
        community: CommunityId,
    ) -> Result<Vec<CommunityBan>, GatewayError> {
        Ok(self
            .state
            .lock()
            .bans
            .get(&community)
            .cloned()
            .unwrap_or_default())
    }

    async fn self_permissions(
        &self,
        community: CommunityId,
    ) -> Result<Permissions, GatewayError> {
        Ok(self
            .state
            .lock()
            .self_permissions
            .get(&community)
            .copied()
            .unwrap_or_default())
    }

    async fn member_permissions(
        &self,
        community: CommunityId,
        user: UserId,
    ) -> Result<Permissions, GatewayError> {
        Ok(self
            .state
            .lock()
            .member_permissions
            .get(&(community, user))
            .copied()
            .unwrap_or_default())
    }

    async fn add_role(
        &self,
        community: CommunityId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), GatewayError> {
        self.permissions_or_denied(community, |p| p.manage_roles, "manage_roles")?;
        let mut state = self.state.lock();
        state.role_grants.push((community, user, role));
        if let Some(members) = state.members.get_mut(&community)
            && let Some(member) = members.iter_mut().find(|m| m.id == user)
            && !member.roles.contains(&role)
        {
            member.roles.push(role);
        }
        Ok(())
    }

    async fn kick(
        &self,
        community: CommunityId,
        user: UserId,
        reason: &str,
    ) -> Result<(), GatewayError> {
        self.permissions_or_denied(community, |p| p.kick_members, "kick_members")?;
        let mut state = self.state.lock();
        state.kicked.push((community, user, reason.to_string()));
        if let Some(members) = state.members.get_mut(&community) {
            members.retain(|m| m.id != user);
        }
        Ok(())
    }

    async fn ban(
        &self,
        community: CommunityId,
        user: UserId,
        reason: &str,
    ) -> Result<(), GatewayError> {
        self.permissions_or_denied(community, |p| p.ban_members, "ban_members")?;
        let mut state = self.state.lock();
        state.banned.push((community, user, reason.to_string()));
        if let Some(members) = state.members.get_mut(&community) {
            members.retain(|m| m.id != user);
        }
        Ok(())
    }

    async fn send_dm(&self, user: UserId, content: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        if state.dm_unreachable.contains(&user) {
            return Err(GatewayError::Platform("user has DMs disabled".into()));
        }
        state.dms.push((user, content.to_string()));
        Ok(())
    }

    async fn publish_modlog(
        &self,
        community: CommunityId,
        content: &str,
        marker: Option<UserId>,
    ) -> Result<MessageId, GatewayError> {
        let mut state = self.state.lock();
        let message = MessageId(state.next_message_id);
        state.next_message_id += 1;
        state
            .modlog
            .push((message, community, content.to_string(), marker));
        Ok(message)
    }

    async fn modlog_marker(
        &self,
        _community: CommunityId,
        message: MessageId,
    ) -> Result<Option<UserId>, GatewayError> {
        Ok(self
            .state
            .lock()
            .modlog
            .iter()
            .find(|(id, _, _, _)| *id == message)
            .and_then(|(_, _, _, marker)| *marker))
    }

    async fn notify_operator(&self, content: &str) -> Result<(), GatewayError> {
        self.state.lock().operator_notices.push(content.to_string());
        Ok(())
    }
}
