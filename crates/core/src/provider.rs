use std::time::Duration;

use thiserror::Error;

/// Result type returned by payment provider adapters.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failure taxonomy for remote payment provider calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Network failure, timeout or provider-side 5xx.
    #[error("payment provider is temporarily unavailable: {0}")]
    Transient(String),

    /// Provider throttled the call.
    #[error("payment provider rate limit exceeded")]
    RateLimited {
        /// Delay requested by the provider, when it sent one.
        retry_after: Option<Duration>,
    },

    /// Provider rejected the request payload.
    #[error("payment provider rejected the request: {0}")]
    InvalidRequest(String),

    /// Provider rejected the tenant's credential.
    #[error("payment provider rejected the tenant credential; tenant provider configuration must be fixed")]
    AuthRejected,
}

impl ProviderError {
    /// Returns whether the same call may succeed when retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::RateLimited { .. })
    }

    /// Returns the stable machine-readable error kind surfaced to callers.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transient(_) | Self::RateLimited { .. } => "ProviderUnavailable",
            Self::InvalidRequest(_) => "ProviderInvalidRequest",
            Self::AuthRejected => "ProviderMisconfigured",
        }
    }

    /// Returns the provider-requested retry delay, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
