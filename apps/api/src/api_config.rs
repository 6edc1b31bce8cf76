use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use paygate_application::RetryPolicy;
use paygate_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

const MIN_ADMIN_TOKEN_LENGTH: usize = 32;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Time left for store reads and writes once provider retries are exhausted.
const REQUEST_TIMEOUT_HEADROOM: Duration = Duration::from_secs(5);

/// Where tenants and resource records are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Postgres { database_url: String },
    Memory,
}

/// Which provider adapter serves remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    Http,
    Sandbox,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub mode: ProviderMode,
    pub base_url: Url,
    pub timeout: Duration,
    pub retry_policy: RetryPolicy,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub store: StoreConfig,
    pub api_host: String,
    pub api_port: u16,
    pub admin_token: String,
    pub credential_encryption_key: String,
    pub provider: ProviderConfig,
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    pub fn from_lookup<F>(migrate_only: bool, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("STORE_MODE").as_deref().unwrap_or("postgres") {
            "postgres" => StoreConfig::Postgres {
                database_url: required(&lookup, "DATABASE_URL")?,
            },
            "memory" => StoreConfig::Memory,
            other => {
                return Err(AppError::Validation(format!(
                    "STORE_MODE must be either 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        if migrate_only && store == StoreConfig::Memory {
            return Err(AppError::Validation(
                "migrate requires STORE_MODE=postgres".to_owned(),
            ));
        }

        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = lookup("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let admin_token = required(&lookup, "ADMIN_TOKEN")?;
        if admin_token.len() < MIN_ADMIN_TOKEN_LENGTH {
            return Err(AppError::Validation(format!(
                "ADMIN_TOKEN must be at least {MIN_ADMIN_TOKEN_LENGTH} characters"
            )));
        }

        let credential_encryption_key = required(&lookup, "CREDENTIAL_ENCRYPTION_KEY")?;
        if credential_encryption_key.len() != 64 {
            return Err(AppError::Validation(
                "CREDENTIAL_ENCRYPTION_KEY must be 64 hex characters".to_owned(),
            ));
        }

        let mode = match lookup("PROVIDER_MODE").as_deref().unwrap_or("http") {
            "http" => ProviderMode::Http,
            "sandbox" => ProviderMode::Sandbox,
            other => {
                return Err(AppError::Validation(format!(
                    "PROVIDER_MODE must be either 'http' or 'sandbox', got '{other}'"
                )));
            }
        };
        let base_url = lookup("PROVIDER_API_BASE_URL")
            .unwrap_or_else(|| "https://api.stripe.com".to_owned());
        let base_url = Url::parse(base_url.as_str()).map_err(|error| {
            AppError::Validation(format!("invalid PROVIDER_API_BASE_URL: {error}"))
        })?;

        let retry_policy = RetryPolicy {
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
        };

        let provider_timeout =
            Duration::from_millis(parse_u64(&lookup, "PROVIDER_TIMEOUT_MS", 10_000)?);
        let retry_budget = retry_policy.worst_case_duration(provider_timeout);
        let request_timeout = match lookup("REQUEST_TIMEOUT_MS") {
            Some(_) => {
                let request_timeout =
                    Duration::from_millis(parse_u64(&lookup, "REQUEST_TIMEOUT_MS", 0)?);
                if request_timeout <= retry_budget {
                    return Err(AppError::Validation(format!(
                        "REQUEST_TIMEOUT_MS must exceed the provider retry budget of {}ms",
                        retry_budget.as_millis()
                    )));
                }
                request_timeout
            }
            None => {
                DEFAULT_REQUEST_TIMEOUT.max(retry_budget.saturating_add(REQUEST_TIMEOUT_HEADROOM))
            }
        };

        Ok(Self {
            migrate_only,
            store,
            api_host,
            api_port,
            admin_token,
            credential_encryption_key,
            provider: ProviderConfig {
                mode,
                base_url,
                timeout: provider_timeout,
                retry_policy,
            },
            request_timeout,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required<F>(lookup: &F, name: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn parse_u64<F>(lookup: &F, name: &str, default_value: u64) -> Result<u64, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .parse::<u64>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        None => Ok(default_value),
    }
}
