use chrono::{DateTime, Utc};
use paygate_application::{ProvisionTenantInput, ProvisionedTenant};
use paygate_core::AppError;
use paygate_domain::{ApiKey, ProviderCredential, Tenant};
use serde::{Deserialize, Serialize};

/// Incoming payload for tenant provisioning.
#[derive(Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    pub provider_credential: String,
    pub api_key: Option<String>,
}

impl TryFrom<CreateTenantRequest> for ProvisionTenantInput {
    type Error = AppError;

    fn try_from(request: CreateTenantRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: request.name,
            provider_credential: ProviderCredential::new(request.provider_credential)?,
            api_key: request.api_key.map(ApiKey::new).transpose()?,
        })
    }
}

/// API representation of a tenant. Secrets are never included.
#[derive(Debug, Serialize)]
pub struct TenantResponse {
    pub id: String,
    pub name: String,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
}

impl From<Tenant> for TenantResponse {
    fn from(tenant: Tenant) -> Self {
        Self {
            id: tenant.id().to_string(),
            name: tenant.name().as_str().to_owned(),
            status: tenant.status().as_str(),
            created_at: tenant.created_at(),
        }
    }
}

/// Provisioning result; the only response that carries the raw api key.
#[derive(Serialize)]
pub struct ProvisionedTenantResponse {
    #[serde(flatten)]
    pub tenant: TenantResponse,
    pub api_key: String,
}

impl From<ProvisionedTenant> for ProvisionedTenantResponse {
    fn from(provisioned: ProvisionedTenant) -> Self {
        Self {
            api_key: provisioned.api_key.expose().to_owned(),
            tenant: TenantResponse::from(provisioned.tenant),
        }
    }
}
