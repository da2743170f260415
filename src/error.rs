//! Error taxonomy for the search & advisory engine.

use thiserror::Error;

use crate::rate_limit::DeniedReason;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Caller error (missing query/topic); not worth retrying.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Local limiter said no; caller should back off.
    #[error("{}", .reason.message())]
    RateLimited { reason: DeniedReason },

    /// The remote generation backend reported quota / rate-limit exhaustion.
    #[error("API quota exceeded. Please try again later.")]
    UpstreamQuotaExceeded,

    #[error("Generation backend failed: {0}")]
    UpstreamFailure(String),

    /// No generation backend was configured at startup.
    #[error("Generation backend is not configured")]
    NotConfigured,
}

impl EngineError {
    /// HTTP status the transport layer should answer with.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::RateLimited { .. } | Self::UpstreamQuotaExceeded => 429,
            Self::UpstreamFailure(_) => 502,
            Self::NotConfigured => 503,
        }
    }

    /// Short machine-readable kind, used for metric labels.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::RateLimited { .. } => "rate_limited",
            Self::UpstreamQuotaExceeded => "upstream_quota",
            Self::UpstreamFailure(_) => "upstream_failure",
            Self::NotConfigured => "not_configured",
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
