use std::sync::Arc;

use paygate_application::{
    CredentialCipher, ResourceOrchestrator, TenantAdminService, TenantResolver,
};
use paygate_core::AppError;
use paygate_infrastructure::AesCredentialCipher;
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

mod provider;
mod repositories;

/// Wires stores, provider and services. `pool` is `None` in memory mode.
pub fn build_app_state(pool: Option<PgPool>, config: &ApiConfig) -> Result<AppState, AppError> {
    let repositories = repositories::build_repository_set(pool.as_ref());
    let cipher: Arc<dyn CredentialCipher> = Arc::new(AesCredentialCipher::from_hex(
        config.credential_encryption_key.as_str(),
    )?);
    let caller = provider::build_provider_caller(&config.provider)?;

    Ok(AppState {
        tenant_resolver: TenantResolver::new(
            repositories.tenant_repository.clone(),
            cipher.clone(),
        ),
        orchestrator: ResourceOrchestrator::new(repositories.resource_repository, caller),
        tenant_admin_service: TenantAdminService::new(repositories.tenant_repository, cipher),
        admin_token: config.admin_token.clone(),
        postgres_pool: pool,
    })
}
