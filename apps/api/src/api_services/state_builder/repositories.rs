use std::sync::Arc;

use paygate_application::{ResourceRepository, TenantRepository};
use paygate_infrastructure::{
    InMemoryResourceRepository, InMemoryTenantRepository, PostgresResourceRepository,
    PostgresTenantRepository,
};
use sqlx::PgPool;
use tracing::warn;

pub(super) struct RepositorySet {
    pub(super) tenant_repository: Arc<dyn TenantRepository>,
    pub(super) resource_repository: Arc<dyn ResourceRepository>,
}

pub(super) fn build_repository_set(pool: Option<&PgPool>) -> RepositorySet {
    match pool {
        Some(pool) => RepositorySet {
            tenant_repository: Arc::new(PostgresTenantRepository::new(pool.clone())),
            resource_repository: Arc::new(PostgresResourceRepository::new(pool.clone())),
        },
        None => {
            warn!("using in-memory stores; tenants and records are lost on restart");
            RepositorySet {
                tenant_repository: Arc::new(InMemoryTenantRepository::new()),
                resource_repository: Arc::new(InMemoryResourceRepository::new()),
            }
        }
    }
}
