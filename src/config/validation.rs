//! Per-community validation policy snapshot.

use crate::platform::RoleId;
use chrono::Duration;
use serde::Deserialize;

/// One community's validation policy, read from the configuration
/// collaborator at event time. The engine never mutates or persists it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidationPolicy {
    /// Whether validation runs for this community at all.
    #[serde(default)]
    pub enabled: bool,

    /// The trust role granted on approval. Validation without a role
    /// still produces audit messages, but has nothing to grant.
    #[serde(default)]
    pub role_id: Option<RoleId>,

    /// Members still unverified after this many seconds are eligible for
    /// the purge job. Consumed by the command surface to compute the
    /// purge cutoff; the engine itself takes an explicit cutoff.
    #[serde(default)]
    pub kick_unverified_after_secs: Option<u64>,
}

impl ValidationPolicy {
    /// The auto-kick window as a chrono duration, if configured.
    pub fn kick_unverified_after(&self) -> Option<Duration> {
        self.kick_unverified_after_secs
            .map(|secs| Duration::seconds(secs as i64))
    }
}
