//! Approving validators.
//!
//! Each approves on a single platform signal and never rejects. They sit
//! late in the chain so a legitimate account always wins over earlier
//! false-positive rejections.

use super::context::ValidationContext;
use super::{RuleError, Services};
use crate::platform::UserId;

/// Approves premium subscribers. User bots and alt accounts rarely pay.
#[derive(Debug)]
pub struct NitroApprover;

impl NitroApprover {
    pub(super) async fn evaluate(
        &self,
        _services: &Services<'_>,
        ctx: &mut ValidationContext,
    ) -> Result<(), RuleError> {
        if ctx.member.premium {
            ctx.add_approval_reason(
                "User has a premium subscription. User bots and alt accounts rarely do.",
            );
        }
        Ok(())
    }
}

/// Approves platform-distinguished accounts: staff, partners, verified
/// developers.
#[derive(Debug)]
pub struct DistinguishedUserApprover;

impl DistinguishedUserApprover {
    pub(super) async fn evaluate(
        &self,
        _services: &Services<'_>,
        ctx: &mut ValidationContext,
    ) -> Result<(), RuleError> {
        let flags = ctx.member.flags;
        if flags.staff {
            ctx.add_approval_reason("User is platform staff.");
        }
        if flags.partner {
            ctx.add_approval_reason("User owns a partnered community.");
        }
        if flags.verified_developer {
            ctx.add_approval_reason("User is a verified developer.");
        }
        Ok(())
    }
}

/// Approves bot accounts: bots can only be added by community
/// moderators, so their presence is already vouched for.
#[derive(Debug)]
pub struct BotApprover;

impl BotApprover {
    pub(super) async fn evaluate(
        &self,
        _services: &Services<'_>,
        ctx: &mut ValidationContext,
    ) -> Result<(), RuleError> {
        if ctx.member.bot {
            ctx.add_approval_reason("User is a bot. Bots can only be added by moderators.");
        }
        Ok(())
    }
}

/// Approves the deployment operator unconditionally.
#[derive(Debug)]
pub struct BotOwnerApprover {
    operator: Option<UserId>,
}

impl BotOwnerApprover {
    pub fn new(operator: Option<UserId>) -> Self {
        Self { operator }
    }

    pub(super) async fn evaluate(
        &self,
        _services: &Services<'_>,
        ctx: &mut ValidationContext,
    ) -> Result<(), RuleError> {
        if self.operator == Some(ctx.member.id) {
            ctx.add_approval_reason("User operates this deployment.");
        }
        Ok(())
    }
}
