//! gatewarden - admission control for chat communities.
//!
//! Decides, for each user joining a community, whether to grant trust
//! (auto-verify) or flag for manual moderator review; lets moderators
//! override that decision by reacting to the audit message; supports a
//! time-bounded per-community lockdown; and bulk-removes members that
//! never verified.
//!
//! The chat platform itself stays behind the [`platform::ChatGateway`]
//! trait; [`engine::ValidationEngine`] is the surface event and command
//! handlers talk to.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod modlog;
pub mod platform;
pub mod security;
pub mod validation;

pub use config::{EngineConfig, ValidationPolicy};
pub use engine::ValidationEngine;
pub use error::{EngineError, EngineResult};
pub use modlog::{BanNotice, OverrideSignal};
pub use validation::Verdict;
