//! Mutable accumulator for one user's evaluation.

use crate::config::ValidationPolicy;
use crate::db::{Database, DbError};
use crate::platform::{ChatGateway, GatewayError, Member, RoleId};

/// The outcome of one evaluation, as handed back to callers.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub approved: bool,
    pub approval_reasons: Vec<String>,
    pub rejection_reasons: Vec<String>,
}

/// Per-evaluation state: the member under evaluation, the community's
/// policy snapshot, the running verdict, and the full reason trail.
///
/// Created once per evaluation, mutated only by the validator chain, and
/// discarded after the audit message is sent.
///
/// The verdict invariant: `approved` always equals the polarity of the
/// last validator that recorded a reason (`true` if none has). Both
/// reason lists are append-only; an approver overturning a rejection
/// does not erase the rejection's trail.
#[derive(Debug)]
pub struct ValidationContext {
    pub member: Member,
    pub policy: ValidationPolicy,
    /// The trust role to grant on approval, resolved from the policy.
    pub trust_role: Option<RoleId>,
    pub approved: bool,
    pub approval_reasons: Vec<String>,
    pub rejection_reasons: Vec<String>,
    usernames: Option<Vec<String>>,
}

impl ValidationContext {
    pub fn new(member: Member, policy: ValidationPolicy) -> Self {
        let trust_role = policy.role_id;
        Self {
            member,
            policy,
            trust_role,
            approved: true,
            approval_reasons: Vec::new(),
            rejection_reasons: Vec::new(),
            usernames: None,
        }
    }

    pub fn add_approval_reason(&mut self, reason: impl Into<String>) {
        self.approval_reasons.push(reason.into());
        self.approved = true;
    }

    pub fn add_rejection_reason(&mut self, reason: impl Into<String>) {
        self.rejection_reasons.push(reason.into());
        self.approved = false;
    }

    /// Every name the user is known by: the current username plus the
    /// stored history. Computed at most once per context; later calls
    /// return the memoized set.
    pub async fn usernames(&mut self, db: &Database) -> Result<Vec<String>, DbError> {
        if let Some(names) = &self.usernames {
            return Ok(names.clone());
        }
        let mut names = vec![self.member.username.clone()];
        for name in db.usernames().usernames_of(self.member.id).await? {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        self.usernames = Some(names.clone());
        Ok(names)
    }

    /// Grant the trust role if the verdict is approval and the member
    /// does not already hold it.
    pub async fn apply_trust_role(&self, gateway: &dyn ChatGateway) -> Result<(), GatewayError> {
        if !self.approved {
            return Ok(());
        }
        let Some(role) = self.trust_role else {
            return Ok(());
        };
        if self.member.has_role(role) {
            return Ok(());
        }
        gateway
            .add_role(self.member.community_id, self.member.id, role)
            .await
    }

    pub fn verdict(&self) -> Verdict {
        Verdict {
            approved: self.approved,
            approval_reasons: self.approval_reasons.clone(),
            rejection_reasons: self.rejection_reasons.clone(),
        }
    }
}
