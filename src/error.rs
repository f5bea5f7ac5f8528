//! Unified error handling for gatewarden.
//!
//! Every failure in this crate degrades to "leave the user unresolved,
//! tell a human": nothing here aborts the process. The engine surface
//! reports [`EngineError`]; validator faults are isolated by the pipeline
//! driver and never reach callers.

use crate::db::DbError;
use crate::platform::{CommunityId, GatewayError};
use thiserror::Error;

/// Errors reported by the engine surface.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Validation was invoked for a community without an enabled policy.
    /// No state is mutated.
    #[error("validation is not configured for community {0}")]
    NotConfigured(CommunityId),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("database error: {0}")]
    Db(#[from] DbError),
}

impl EngineError {
    /// Static error code for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotConfigured(_) => "not_configured",
            Self::Gateway(e) => e.error_code(),
            Self::Db(_) => "db_error",
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
