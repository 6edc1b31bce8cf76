use paygate_application::{ResourceOrchestrator, TenantAdminService, TenantResolver};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub tenant_resolver: TenantResolver,
    pub orchestrator: ResourceOrchestrator,
    pub tenant_admin_service: TenantAdminService,
    pub admin_token: String,
    /// Present when records are stored in Postgres; probed by `/health`.
    pub postgres_pool: Option<PgPool>,
}
