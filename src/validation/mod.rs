//! The validation pipeline: a fixed, ordered chain of policy rules
//! evaluated against a per-user context.
//!
//! Validators are a closed set of tagged variants held in a fixed
//! sequence, so chain order stays auditable in one place. Each validator
//! communicates only by appending reasons to the context; the boolean
//! verdict is whatever the last reason-recording validator says, while
//! the full reason history is retained for the audit trail.
//!
//! A validator that *faults* (storage or platform error, not a
//! rejection) is isolated: the driver logs it, counts it, tells the
//! operator, and moves on. One broken rule must not block or wrongly
//! admit an entire cohort.

pub mod approvers;
pub mod context;
pub mod normalize;
pub mod rejectors;

pub use context::{ValidationContext, Verdict};

use crate::config::EngineConfig;
use crate::db::{Database, DbError};
use crate::platform::{ChatGateway, GatewayError};
use crate::security::{BanStorage, LockdownController};
use chrono::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use approvers::{BotApprover, BotOwnerApprover, DistinguishedUserApprover, NitroApprover};
use rejectors::{
    BannedUserRejector, BannedUsernameRejector, DeletedAccountRejector, LockdownRejector,
    MemberPredicate, NameField, NameMatchRejector, NewAccountRejector, NoAvatarRejector,
    StringFilterRejector,
};

/// Errors a validator can hit while evaluating.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// A fault isolated by the pipeline driver: which validator, and why.
#[derive(Debug)]
pub struct RuleFault {
    pub validator: &'static str,
    pub source: RuleError,
}

/// Shared handles the validators evaluate against.
pub struct Services<'a> {
    pub gateway: &'a dyn ChatGateway,
    pub db: &'a Database,
    pub bans: &'a BanStorage,
    pub lockdowns: &'a LockdownController,
}

/// One unit of policy. Closed set; chain order is fixed at construction.
#[derive(Debug)]
pub enum Validator {
    NewAccount(NewAccountRejector),
    NoAvatar(NoAvatarRejector),
    DeletedAccount(DeletedAccountRejector),
    StringFilter(StringFilterRejector),
    NameMatch(NameMatchRejector),
    BannedUser(BannedUserRejector),
    BannedUsername(BannedUsernameRejector),
    Lockdown(LockdownRejector),
    Nitro(NitroApprover),
    Distinguished(DistinguishedUserApprover),
    Bot(BotApprover),
    BotOwner(BotOwnerApprover),
}

impl Validator {
    /// Stable name for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewAccount(_) => "new_account",
            Self::NoAvatar(_) => "no_avatar",
            Self::DeletedAccount(_) => "deleted_account",
            Self::StringFilter(_) => "string_filter",
            Self::NameMatch(_) => "name_match",
            Self::BannedUser(_) => "banned_user",
            Self::BannedUsername(_) => "banned_username",
            Self::Lockdown(_) => "lockdown",
            Self::Nitro(_) => "nitro",
            Self::Distinguished(_) => "distinguished",
            Self::Bot(_) => "bot",
            Self::BotOwner(_) => "bot_owner",
        }
    }

    pub async fn evaluate(
        &self,
        services: &Services<'_>,
        ctx: &mut ValidationContext,
    ) -> Result<(), RuleFault> {
        let result = match self {
            Self::NewAccount(v) => v.evaluate(services, ctx).await,
            Self::NoAvatar(v) => v.evaluate(services, ctx).await,
            Self::DeletedAccount(v) => v.evaluate(services, ctx).await,
            Self::StringFilter(v) => v.evaluate(services, ctx).await,
            Self::NameMatch(v) => v.evaluate(services, ctx).await,
            Self::BannedUser(v) => v.evaluate(services, ctx).await,
            Self::BannedUsername(v) => v.evaluate(services, ctx).await,
            Self::Lockdown(v) => v.evaluate(services, ctx).await,
            Self::Nitro(v) => v.evaluate(services, ctx).await,
            Self::Distinguished(v) => v.evaluate(services, ctx).await,
            Self::Bot(v) => v.evaluate(services, ctx).await,
            Self::BotOwner(v) => v.evaluate(services, ctx).await,
        };
        result.map_err(|source| RuleFault {
            validator: self.name(),
            source,
        })
    }
}

/// The ordered validator chain and its driver.
pub struct Chain {
    validators: Vec<Validator>,
}

impl Chain {
    pub fn new(validators: Vec<Validator>) -> Self {
        Self { validators }
    }

    /// The standard chain.
    ///
    /// Order is significant and deliberate: suspicion-level checks
    /// (high recall, low precision) first, questionable-content checks
    /// next, malice-level checks (low recall, high precision) after
    /// that, and override-level approvers last so that distinguished
    /// users, bots, and the operator always win over earlier
    /// false positives.
    pub fn standard(config: &EngineConfig) -> Self {
        let filters = &config.filters;
        let min_len = config.name_match_min_length;
        Self::new(vec![
            // Suspicion level.
            Validator::NewAccount(NewAccountRejector::new(Duration::days(
                config.new_account_lookback_days as i64,
            ))),
            Validator::NoAvatar(NoAvatarRejector),
            Validator::DeletedAccount(DeletedAccountRejector),
            Validator::StringFilter(StringFilterRejector::new(
                "Likely user bot. ",
                &filters.user_bot_names,
                false,
            )),
            Validator::StringFilter(StringFilterRejector::new(
                "Likely user bot. ",
                &filters.user_bot_names_fullmatch,
                true,
            )),
            // Questionable level.
            Validator::NameMatch(NameMatchRejector::new(
                "Username matches moderator's. ",
                MemberPredicate::Moderator,
                NameField::Username,
                min_len,
            )),
            Validator::NameMatch(NameMatchRejector::new(
                "Username matches moderator's. ",
                MemberPredicate::Moderator,
                NameField::Nickname,
                min_len,
            )),
            Validator::NameMatch(NameMatchRejector::new(
                "Username matches bot's. ",
                MemberPredicate::Bot,
                NameField::Username,
                min_len,
            )),
            Validator::NameMatch(NameMatchRejector::new(
                "Username matches bot's. ",
                MemberPredicate::Bot,
                NameField::Nickname,
                min_len,
            )),
            Validator::StringFilter(StringFilterRejector::new(
                "Offensive username. ",
                &filters.offensive_usernames,
                false,
            )),
            Validator::StringFilter(StringFilterRejector::new(
                "Sexually inappropriate username. ",
                &filters.sexually_inappropriate_usernames,
                false,
            )),
            // A paying subscriber is unlikely to be a user bot or alt;
            // this overturns any of the name-based suspicion above, but
            // not the malice-level checks below.
            Validator::Nitro(NitroApprover),
            // Malice level.
            Validator::BannedUser(BannedUserRejector::new(config.min_community_size)),
            Validator::BannedUsername(BannedUsernameRejector),
            Validator::Distinguished(DistinguishedUserApprover),
            Validator::Lockdown(LockdownRejector),
            // Override level.
            Validator::Bot(BotApprover),
            Validator::BotOwner(BotOwnerApprover::new(config.operator_id)),
        ])
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Run the chain strictly in sequence and return the final verdict.
    ///
    /// Faults are isolated per validator; the chain always runs to the
    /// end. Reasons stay on the context for the audit message.
    pub async fn run(&self, services: &Services<'_>, ctx: &mut ValidationContext) -> bool {
        for validator in &self.validators {
            if let Err(fault) = validator.evaluate(services, ctx).await {
                crate::metrics::record_rule_fault(fault.validator);
                warn!(
                    validator = fault.validator,
                    user = %ctx.member.id,
                    error = %fault.source,
                    "Validator fault; continuing chain"
                );
                let notice = format!(
                    "Validator `{}` faulted while evaluating {} ({}): {}",
                    fault.validator, ctx.member.username, ctx.member.id, fault.source
                );
                if let Err(e) = services.gateway.notify_operator(&notice).await {
                    debug!(error = %e, "Operator notice failed");
                }
            }
        }
        ctx.approved
    }
}
