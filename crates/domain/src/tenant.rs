//! Tenant domain types.
//!
//! A tenant is a caller of the gateway. It owns an API key, a provider
//! credential and every resource record created under that key.

use std::fmt::{Debug, Formatter};

use chrono::{DateTime, Utc};
use paygate_core::{AppError, AppResult, NonEmptyString, TenantId};
use serde::{Deserialize, Serialize};

/// Exact length of every tenant API key.
pub const API_KEY_LENGTH: usize = 64;

/// Tenant lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    /// Tenant may call the gateway.
    Active,
    /// Tenant is blocked; its records are retained.
    Suspended,
}

impl TenantStatus {
    /// Returns the storage string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }

    /// Parses a storage string into a tenant status.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            _ => Err(AppError::Validation(format!(
                "unknown tenant status '{value}'"
            ))),
        }
    }
}

/// Raw tenant API key.
///
/// Only ever held in memory between the request header and the digest
/// computation, or once when the key is issued.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Validates an administrator-supplied or generated API key.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();

        if value.chars().count() != API_KEY_LENGTH {
            return Err(AppError::Validation(format!(
                "api key must be exactly {API_KEY_LENGTH} characters"
            )));
        }

        if !value.chars().all(|character| character.is_ascii_graphic()) {
            return Err(AppError::Validation(
                "api key must contain only visible ASCII characters".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the raw key value.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl Debug for ApiKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("ApiKey(<redacted>)")
    }
}

/// Secret the gateway presents to the payment provider on a tenant's behalf.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredential(String);

impl ProviderCredential {
    /// Creates a validated provider credential.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "provider credential must not be empty".to_owned(),
            ));
        }

        if value.chars().any(char::is_whitespace) {
            return Err(AppError::Validation(
                "provider credential must not contain whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the raw secret for building provider requests.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl Debug for ProviderCredential {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("ProviderCredential(<redacted>)")
    }
}

/// Tenant of the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    id: TenantId,
    name: NonEmptyString,
    status: TenantStatus,
    created_at: DateTime<Utc>,
}

impl Tenant {
    /// Creates an active tenant.
    pub fn new(id: TenantId, name: impl Into<String>, created_at: DateTime<Utc>) -> AppResult<Self> {
        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
            status: TenantStatus::Active,
            created_at,
        })
    }

    /// Rebuilds a tenant from stored values.
    pub fn restore(
        id: TenantId,
        name: impl Into<String>,
        status: TenantStatus,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
            status,
            created_at,
        })
    }

    /// Returns the tenant identifier.
    #[must_use]
    pub fn id(&self) -> TenantId {
        self.id
    }

    /// Returns the tenant display name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the tenant status.
    #[must_use]
    pub fn status(&self) -> TenantStatus {
        self.status
    }

    /// Returns when the tenant was provisioned.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns whether the tenant may call the gateway.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }

    /// Returns a copy of the tenant with a new status.
    #[must_use]
    pub fn with_status(&self, status: TenantStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_requires_exact_length() {
        assert!(ApiKey::new("a".repeat(API_KEY_LENGTH)).is_ok());
        assert!(ApiKey::new("a".repeat(API_KEY_LENGTH - 1)).is_err());
        assert!(ApiKey::new("a".repeat(API_KEY_LENGTH + 1)).is_err());
    }

    #[test]
    fn api_key_rejects_whitespace() {
        let mut value = "a".repeat(API_KEY_LENGTH - 1);
        value.push(' ');
        assert!(ApiKey::new(value).is_err());
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let key = ApiKey::new("k".repeat(API_KEY_LENGTH)).unwrap_or_else(|_| unreachable!());
        let credential = ProviderCredential::new("sk_test_secret").unwrap_or_else(|_| unreachable!());

        assert!(!format!("{key:?}").contains("kkkk"));
        assert!(!format!("{credential:?}").contains("sk_test_secret"));
    }

    #[test]
    fn tenant_status_round_trips_storage_string() {
        for status in [TenantStatus::Active, TenantStatus::Suspended] {
            assert!(matches!(TenantStatus::parse(status.as_str()), Ok(parsed) if parsed == status));
        }
        assert!(TenantStatus::parse("deleted").is_err());
    }

    #[test]
    fn suspended_tenant_is_not_active() {
        let tenant = Tenant::new(TenantId::new(), "Acme", Utc::now()).unwrap_or_else(|_| unreachable!());
        assert!(tenant.is_active());
        assert!(!tenant.with_status(TenantStatus::Suspended).is_active());
    }
}
