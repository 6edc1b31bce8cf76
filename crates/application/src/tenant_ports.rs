use async_trait::async_trait;

use paygate_core::{AppResult, TenantId};
use paygate_domain::{Tenant, TenantStatus};

/// Tenant row as persisted by the credential store.
#[derive(Debug, Clone)]
pub struct StoredTenant {
    /// Tenant entity.
    pub tenant: Tenant,
    /// SHA-256 hex digest of the tenant API key.
    pub api_key_digest: String,
    /// Nonce-prefixed ciphertext of the provider credential.
    pub encrypted_provider_credential: Vec<u8>,
}

/// Repository port for tenants and their credentials.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Finds the tenant owning the given API key digest.
    async fn find_by_api_key_digest(&self, api_key_digest: &str)
    -> AppResult<Option<StoredTenant>>;

    /// Finds a tenant by identifier.
    async fn find_tenant(&self, tenant_id: TenantId) -> AppResult<Option<StoredTenant>>;

    /// Persists a newly provisioned tenant.
    ///
    /// Fails with `Conflict` when the API key digest is already taken.
    async fn create_tenant(&self, tenant: StoredTenant) -> AppResult<()>;

    /// Changes a tenant's status and returns the updated tenant.
    async fn update_status(&self, tenant_id: TenantId, status: TenantStatus) -> AppResult<Tenant>;

    /// Lists all tenants ordered by creation time.
    async fn list_tenants(&self) -> AppResult<Vec<Tenant>>;
}

/// Port for encrypting provider credentials at rest.
pub trait CredentialCipher: Send + Sync {
    /// Encrypts a provider credential for storage.
    fn encrypt(&self, plaintext: &[u8]) -> AppResult<Vec<u8>>;

    /// Decrypts a stored provider credential.
    fn decrypt(&self, ciphertext: &[u8]) -> AppResult<Vec<u8>>;
}
