//! Paygate reconciliation worker.
//!
//! Finishes records left `pending` or `cancellation_pending` by requests that
//! timed out or crashed after calling the provider.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use paygate_application::{
    CredentialCipher, ProviderCaller, ReconciliationService, ResourceOrchestrator,
    ResourceRepository, RetryPolicy, TenantRepository, TenantResolver,
};
use paygate_core::{AppError, AppResult};
use paygate_infrastructure::{
    AesCredentialCipher, HttpPaymentProvider, PostgresResourceRepository,
    PostgresTenantRepository,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, Clone)]
struct WorkerConfig {
    database_url: String,
    credential_encryption_key: String,
    provider_base_url: Url,
    provider_timeout: Duration,
    retry_policy: RetryPolicy,
    interval: Duration,
    batch_size: usize,
    grace: Duration,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::from_lookup(|name| env::var(name).ok())?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    let reconciliation_service = build_reconciliation_service(pool, &config)?;

    info!(
        interval_ms = config.interval.as_millis(),
        batch_size = config.batch_size,
        grace_seconds = config.grace.as_secs(),
        provider_base_url = %config.provider_base_url,
        "paygate-worker started"
    );

    loop {
        if let Err(error) = reconciliation_service
            .reconcile_batch(config.batch_size, config.grace)
            .await
        {
            warn!(error = %error, "reconciliation batch failed");
        }

        tokio::time::sleep(config.interval).await;
    }
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn build_reconciliation_service(
    pool: PgPool,
    config: &WorkerConfig,
) -> AppResult<ReconciliationService> {
    let tenant_repository: Arc<dyn TenantRepository> =
        Arc::new(PostgresTenantRepository::new(pool.clone()));
    let resource_repository: Arc<dyn ResourceRepository> =
        Arc::new(PostgresResourceRepository::new(pool));
    let cipher: Arc<dyn CredentialCipher> = Arc::new(AesCredentialCipher::from_hex(
        config.credential_encryption_key.as_str(),
    )?);

    let http_client = reqwest::Client::builder()
        .timeout(config.provider_timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
    let caller = ProviderCaller::new(
        Arc::new(HttpPaymentProvider::new(
            http_client,
            config.provider_base_url.as_str(),
        )),
        config.retry_policy,
        config.provider_timeout,
    );

    Ok(ReconciliationService::new(
        TenantResolver::new(tenant_repository, cipher),
        resource_repository.clone(),
        ResourceOrchestrator::new(resource_repository, caller),
    ))
}

impl WorkerConfig {
    fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = required(&lookup, "DATABASE_URL")?;
        let credential_encryption_key = required(&lookup, "CREDENTIAL_ENCRYPTION_KEY")?;
        let provider_base_url = lookup("PROVIDER_API_BASE_URL")
            .unwrap_or_else(|| "https://api.stripe.com".to_owned());
        let provider_base_url = Url::parse(provider_base_url.as_str()).map_err(|error| {
            AppError::Validation(format!("invalid PROVIDER_API_BASE_URL: {error}"))
        })?;

        let batch_size = parse_u64(&lookup, "RECONCILE_BATCH_SIZE", 50)?;
        let interval_ms = parse_u64(&lookup, "RECONCILE_INTERVAL_MS", 5_000)?;

        if batch_size == 0 {
            return Err(AppError::Validation(
                "RECONCILE_BATCH_SIZE must be greater than zero".to_owned(),
            ));
        }

        if interval_ms == 0 {
            return Err(AppError::Validation(
                "RECONCILE_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            credential_encryption_key,
            provider_base_url,
            provider_timeout: Duration::from_millis(parse_u64(
                &lookup,
                "PROVIDER_TIMEOUT_MS",
                10_000,
            )?),
            retry_policy: RetryPolicy {
                max_attempts: u32::try_from(parse_u64(&lookup, "PROVIDER_RETRY_MAX_ATTEMPTS", 3)?)
                    .unwrap_or(u32::MAX)
                    .max(1),
                base_delay: Duration::from_millis(parse_u64(
                    &lookup,
                    "PROVIDER_RETRY_BASE_DELAY_MS",
                    200,
                )?),
                max_delay: Duration::from_millis(parse_u64(
                    &lookup,
                    "PROVIDER_RETRY_MAX_DELAY_MS",
                    5_000,
                )?),
            },
            interval: Duration::from_millis(interval_ms),
            batch_size: usize::try_from(batch_size).unwrap_or(usize::MAX),
            grace: Duration::from_secs(parse_u64(&lookup, "RECONCILE_GRACE_SECONDS", 60)?),
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required<F>(lookup: &F, name: &str) -> AppResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn parse_u64<F>(lookup: &F, name: &str, default: u64) -> AppResult<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
