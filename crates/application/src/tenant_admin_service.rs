//! Tenant provisioning and status management.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use paygate_core::{AppResult, TenantId};
use paygate_domain::{ApiKey, ProviderCredential, Tenant, TenantStatus};

use crate::api_key_crypto::{digest_api_key, generate_api_key};
use crate::tenant_ports::{CredentialCipher, StoredTenant, TenantRepository};

/// Input for provisioning a tenant.
#[derive(Debug, Clone)]
pub struct ProvisionTenantInput {
    /// Tenant display name.
    pub name: String,
    /// Provider secret used on the tenant's behalf.
    pub provider_credential: ProviderCredential,
    /// Administrator-chosen API key; generated when absent.
    pub api_key: Option<ApiKey>,
}

/// A freshly provisioned tenant and its raw API key.
///
/// The key is only available here; storage keeps its digest.
#[derive(Debug, Clone)]
pub struct ProvisionedTenant {
    /// Tenant entity.
    pub tenant: Tenant,
    /// Raw API key.
    pub api_key: ApiKey,
}

/// Administrative service for tenants.
#[derive(Clone)]
pub struct TenantAdminService {
    tenant_repository: Arc<dyn TenantRepository>,
    cipher: Arc<dyn CredentialCipher>,
}

impl TenantAdminService {
    /// Creates a tenant administration service.
    #[must_use]
    pub fn new(
        tenant_repository: Arc<dyn TenantRepository>,
        cipher: Arc<dyn CredentialCipher>,
    ) -> Self {
        Self {
            tenant_repository,
            cipher,
        }
    }

    /// Provisions an active tenant and returns its API key once.
    pub async fn provision_tenant(&self, input: ProvisionTenantInput) -> AppResult<ProvisionedTenant> {
        let tenant = Tenant::new(TenantId::new(), input.name.trim(), Utc::now())?;
        let api_key = match input.api_key {
            Some(api_key) => api_key,
            None => generate_api_key()?,
        };
        let encrypted_provider_credential = self
            .cipher
            .encrypt(input.provider_credential.expose().as_bytes())?;

        self.tenant_repository
            .create_tenant(StoredTenant {
                tenant: tenant.clone(),
                api_key_digest: digest_api_key(api_key.expose()),
                encrypted_provider_credential,
            })
            .await?;

        info!(tenant_id = %tenant.id(), "provisioned tenant");
        Ok(ProvisionedTenant { tenant, api_key })
    }

    /// Suspends a tenant; its API key stops resolving.
    pub async fn suspend_tenant(&self, tenant_id: TenantId) -> AppResult<Tenant> {
        let tenant = self
            .tenant_repository
            .update_status(tenant_id, TenantStatus::Suspended)
            .await?;
        info!(tenant_id = %tenant_id, "suspended tenant");
        Ok(tenant)
    }

    /// Reactivates a suspended tenant.
    pub async fn reactivate_tenant(&self, tenant_id: TenantId) -> AppResult<Tenant> {
        let tenant = self
            .tenant_repository
            .update_status(tenant_id, TenantStatus::Active)
            .await?;
        info!(tenant_id = %tenant_id, "reactivated tenant");
        Ok(tenant)
    }

    /// Lists all tenants.
    pub async fn list_tenants(&self) -> AppResult<Vec<Tenant>> {
        self.tenant_repository.list_tenants().await
    }
}
