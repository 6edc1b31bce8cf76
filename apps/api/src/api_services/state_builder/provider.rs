use std::sync::Arc;

use paygate_application::{PaymentProvider, ProviderCaller};
use paygate_core::AppError;
use paygate_infrastructure::{HttpPaymentProvider, SandboxPaymentProvider};
use tracing::{info, warn};

use crate::api_config::{ProviderConfig, ProviderMode};

pub(super) fn build_provider_caller(config: &ProviderConfig) -> Result<ProviderCaller, AppError> {
    let provider: Arc<dyn PaymentProvider> = match config.mode {
        ProviderMode::Http => {
            let http_client = reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|error| {
                    AppError::Internal(format!("failed to build provider http client: {error}"))
                })?;
            info!(base_url = %config.base_url, "using http payment provider");
            Arc::new(HttpPaymentProvider::new(
                http_client,
                config.base_url.as_str(),
            ))
        }
        ProviderMode::Sandbox => {
            warn!("using sandbox payment provider; no remote calls are made");
            Arc::new(SandboxPaymentProvider::new())
        }
    };

    Ok(ProviderCaller::new(
        provider,
        config.retry_policy,
        config.timeout,
    ))
}
