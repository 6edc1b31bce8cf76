//! Bounded retries and timeouts around provider calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use paygate_core::{ProviderError, ProviderResult};

use crate::provider_ports::{PaymentProvider, ProviderObject};

/// Retry schedule for transient provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first call.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each further attempt.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Policy that never waits between attempts.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Returns the delay before retrying after `attempt` failed with `error`.
    ///
    /// Rate limits wait the provider-requested delay, capped at `max_delay`.
    #[must_use]
    pub fn delay_after(&self, attempt: u32, error: &ProviderError) -> Duration {
        if let Some(retry_after) = error.retry_after() {
            return retry_after.min(self.max_delay);
        }

        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1_u32 << exponent)
            .min(self.max_delay)
    }

    /// Longest time [`ProviderCaller::call`] can take when every attempt runs
    /// into `call_timeout` and every wait hits `max_delay`.
    #[must_use]
    pub fn worst_case_duration(&self, call_timeout: Duration) -> Duration {
        let attempts = self.max_attempts.max(1);
        call_timeout
            .saturating_mul(attempts)
            .saturating_add(self.max_delay.saturating_mul(attempts.saturating_sub(1)))
    }
}

/// Provider handle that applies a timeout and the retry policy to every call.
#[derive(Clone)]
pub struct ProviderCaller {
    provider: Arc<dyn PaymentProvider>,
    retry_policy: RetryPolicy,
    call_timeout: Duration,
}

impl ProviderCaller {
    /// Creates a provider caller.
    #[must_use]
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        retry_policy: RetryPolicy,
        call_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            retry_policy,
            call_timeout,
        }
    }

    /// Returns the wrapped provider.
    #[must_use]
    pub fn provider(&self) -> &dyn PaymentProvider {
        self.provider.as_ref()
    }

    /// Runs `call` until it succeeds, fails permanently or attempts run out.
    ///
    /// The closure receives no arguments; callers capture [`Self::provider`].
    pub async fn call<F, Fut>(&self, operation: &str, mut call: F) -> ProviderResult<ProviderObject>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProviderResult<ProviderObject>>,
    {
        let max_attempts = self.retry_policy.max_attempts.max(1);
        let mut attempt = 1_u32;

        loop {
            let outcome = tokio::time::timeout(self.call_timeout, call())
                .await
                .unwrap_or_else(|_| {
                    Err(ProviderError::Transient(format!(
                        "provider call timed out after {}ms",
                        self.call_timeout.as_millis()
                    )))
                });

            match outcome {
                Ok(object) => return Ok(object),
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    let delay = self.retry_policy.delay_after(attempt, &error);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "retrying provider call"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
                Err(error) => return Err(error),
            }
        }
    }
}
