//! Engine configuration.
//!
//! [`EngineConfig`] is the deployment-wide policy knob set, loaded once
//! from TOML at startup. Per-community policy lives in
//! [`ValidationPolicy`], a read-only snapshot handed to the engine by the
//! configuration collaborator on every call.

mod validation;

pub use validation::ValidationPolicy;

use crate::platform::UserId;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Deployment-wide engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Accounts newer than this many days are flagged as suspicious.
    #[serde(default = "default_new_account_lookback_days")]
    pub new_account_lookback_days: u32,

    /// Communities below this member count are ignored when aggregating
    /// ban history.
    #[serde(default = "default_min_community_size")]
    pub min_community_size: u64,

    /// Name-proximity tokens shorter than this are discarded.
    #[serde(default = "default_name_match_min_length")]
    pub name_match_min_length: usize,

    /// How long cached ban history stays fresh before a re-read.
    #[serde(default = "default_ban_cache_ttl_secs")]
    pub ban_cache_ttl_secs: u64,

    /// The deployment operator's account id, approved unconditionally.
    #[serde(default)]
    pub operator_id: Option<UserId>,

    #[serde(default)]
    pub purge: PurgeConfig,

    #[serde(default)]
    pub filters: FilterConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            new_account_lookback_days: default_new_account_lookback_days(),
            min_community_size: default_min_community_size(),
            name_match_min_length: default_name_match_min_length(),
            ban_cache_ttl_secs: default_ban_cache_ttl_secs(),
            operator_id: None,
            purge: PurgeConfig::default(),
            filters: FilterConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Configuration for the unverified-member purge job.
#[derive(Debug, Clone, Deserialize)]
pub struct PurgeConfig {
    /// Membership page size while scanning.
    #[serde(default = "default_purge_page_size")]
    pub page_size: usize,

    /// Kicks dispatched concurrently before awaiting the batch.
    #[serde(default = "default_purge_batch_size")]
    pub batch_size: usize,

    /// Direct-message notice sent before a purge kick. `{}` is replaced
    /// with the community name.
    #[serde(default = "default_purge_dm_template")]
    pub dm_template: String,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            page_size: default_purge_page_size(),
            batch_size: default_purge_batch_size(),
            dm_template: default_purge_dm_template(),
        }
    }
}

/// Username filter lists consumed by the string-filter rejectors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    /// Substring filters for likely user-bot names.
    #[serde(default)]
    pub user_bot_names: Vec<String>,

    /// Full-match filters for likely user-bot names.
    #[serde(default)]
    pub user_bot_names_fullmatch: Vec<String>,

    /// Substring filters for offensive usernames.
    #[serde(default)]
    pub offensive_usernames: Vec<String>,

    /// Substring filters for sexually inappropriate usernames.
    #[serde(default)]
    pub sexually_inappropriate_usernames: Vec<String>,
}

fn default_new_account_lookback_days() -> u32 {
    30
}

fn default_min_community_size() -> u64 {
    150
}

fn default_name_match_min_length() -> usize {
    4
}

fn default_ban_cache_ttl_secs() -> u64 {
    300
}

fn default_purge_page_size() -> usize {
    1000
}

fn default_purge_batch_size() -> usize {
    5
}

fn default_purge_dm_template() -> String {
    "You have been kicked from {} due to not being verified within \
     sufficient time. If you feel this is in error, please contact a \
     mod regarding this."
        .to_string()
}
