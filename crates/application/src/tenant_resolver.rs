//! Bearer credential to tenant resolution.

use std::sync::Arc;

use tracing::{debug, warn};

use paygate_core::{AppError, AppResult, AuthError, TenantId};
use paygate_domain::ProviderCredential;

use crate::api_key_crypto::{UNMATCHED_DIGEST, digest_api_key, digests_match};
use crate::tenant_ports::{CredentialCipher, StoredTenant, TenantRepository};

/// Request-scoped view of the authenticated tenant.
///
/// Built per request and never cached; holds the decrypted provider credential.
#[derive(Debug, Clone)]
pub struct TenantContext {
    tenant_id: TenantId,
    tenant_name: String,
    credential: ProviderCredential,
}

impl TenantContext {
    /// Creates a tenant context.
    #[must_use]
    pub fn new(tenant_id: TenantId, tenant_name: String, credential: ProviderCredential) -> Self {
        Self {
            tenant_id,
            tenant_name,
            credential,
        }
    }

    /// Returns the authenticated tenant id.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the tenant display name.
    #[must_use]
    pub fn tenant_name(&self) -> &str {
        self.tenant_name.as_str()
    }

    /// Returns the provider credential of this tenant.
    #[must_use]
    pub fn credential(&self) -> &ProviderCredential {
        &self.credential
    }
}

/// Resolves API keys to active tenants.
#[derive(Clone)]
pub struct TenantResolver {
    tenant_repository: Arc<dyn TenantRepository>,
    cipher: Arc<dyn CredentialCipher>,
}

impl TenantResolver {
    /// Creates a tenant resolver.
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

    /// Resolves a presented API key to its tenant.
    ///
    /// Unknown and malformed keys follow the same path and fail with the
    /// same error.
    pub async fn resolve(&self, api_key: Option<&str>) -> AppResult<TenantContext> {
        let Some(api_key) = api_key.filter(|value| !value.trim().is_empty()) else {
            debug!("request carried no api key");
            return Err(AuthError::Missing.into());
        };

        let digest = digest_api_key(api_key);
        let stored = self
            .tenant_repository
            .find_by_api_key_digest(digest.as_str())
            .await?;

        let expected_digest = stored
            .as_ref()
            .map_or(UNMATCHED_DIGEST, |tenant| tenant.api_key_digest.as_str());
        let matched = digests_match(expected_digest, digest.as_str());

        let stored = match stored {
            Some(stored) if matched => stored,
            _ => {
                debug!("api key did not match any tenant");
                return Err(AuthError::NotFound.into());
            }
        };

        if !stored.tenant.is_active() {
            warn!(tenant_id = %stored.tenant.id(), "suspended tenant attempted a request");
            return Err(AuthError::Suspended.into());
        }

        let context = self.open_context(stored)?;
        debug!(tenant_id = %context.tenant_id(), "resolved tenant");
        Ok(context)
    }

    /// Loads the context of an active tenant by id, for background work.
    pub async fn load_context(&self, tenant_id: TenantId) -> AppResult<TenantContext> {
        let stored = self
            .tenant_repository
            .find_tenant(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' does not exist")))?;

        if !stored.tenant.is_active() {
            return Err(AuthError::Suspended.into());
        }

        self.open_context(stored)
    }

    fn open_context(&self, stored: StoredTenant) -> AppResult<TenantContext> {
        let tenant_id = stored.tenant.id();
        let plaintext = self
            .cipher
            .decrypt(stored.encrypted_provider_credential.as_slice())?;
        let credential = String::from_utf8(plaintext)
            .ok()
            .and_then(|value| ProviderCredential::new(value).ok())
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "stored provider credential of tenant '{tenant_id}' is unreadable"
                ))
            })?;

        Ok(TenantContext::new(
            tenant_id,
            stored.tenant.name().as_str().to_owned(),
            credential,
        ))
    }
}

#[cfg(test)]
mod tests;
