use std::collections::HashMap;

use async_trait::async_trait;
use paygate_application::{StoredTenant, TenantRepository};
use paygate_core::{AppError, AppResult, TenantId};
use paygate_domain::{Tenant, TenantStatus};
use tokio::sync::RwLock;

/// In-memory credential store for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryTenantRepository {
    tenants: RwLock<HashMap<TenantId, StoredTenant>>,
}

impl InMemoryTenantRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantRepository for InMemoryTenantRepository {
    async fn find_by_api_key_digest(
        &self,
        api_key_digest: &str,
    ) -> AppResult<Option<StoredTenant>> {
        Ok(self
            .tenants
            .read()
            .await
            .values()
            .find(|stored| stored.api_key_digest == api_key_digest)
            .cloned())
    }

    async fn find_tenant(&self, tenant_id: TenantId) -> AppResult<Option<StoredTenant>> {
        Ok(self.tenants.read().await.get(&tenant_id).cloned())
    }

    async fn create_tenant(&self, tenant: StoredTenant) -> AppResult<()> {
        let mut tenants = self.tenants.write().await;
        if tenants
            .values()
            .any(|stored| stored.api_key_digest == tenant.api_key_digest)
        {
            return Err(AppError::Conflict(
                "api key is already assigned to another tenant".to_owned(),
            ));
        }

        let tenant_id = tenant.tenant.id();
        if tenants.contains_key(&tenant_id) {
            return Err(AppError::Conflict(format!(
                "tenant '{tenant_id}' already exists"
            )));
        }

        tenants.insert(tenant_id, tenant);
        Ok(())
    }

    async fn update_status(&self, tenant_id: TenantId, status: TenantStatus) -> AppResult<Tenant> {
        let mut tenants = self.tenants.write().await;
        let stored = tenants
            .get_mut(&tenant_id)
            .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' does not exist")))?;

        stored.tenant = stored.tenant.with_status(status);
        Ok(stored.tenant.clone())
    }

    async fn list_tenants(&self) -> AppResult<Vec<Tenant>> {
        let mut tenants: Vec<Tenant> = self
            .tenants
            .read()
            .await
            .values()
            .map(|stored| stored.tenant.clone())
            .collect();
        tenants.sort_by_key(Tenant::created_at);
        Ok(tenants)
    }
}
