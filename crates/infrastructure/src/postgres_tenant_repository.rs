use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paygate_application::{StoredTenant, TenantRepository};
use paygate_core::{AppError, AppResult, TenantId};
use paygate_domain::{Tenant, TenantStatus};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed credential store.
#[derive(Clone)]
pub struct PostgresTenantRepository {
    pool: PgPool,
}

impl PostgresTenantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TenantRow {
    id: Uuid,
    name: String,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct StoredTenantRow {
    id: Uuid,
    name: String,
    status: String,
    created_at: DateTime<Utc>,
    api_key_digest: String,
    encrypted_provider_credential: Vec<u8>,
}

impl TenantRow {
    fn into_tenant(self) -> AppResult<Tenant> {
        Tenant::restore(
            TenantId::from_uuid(self.id),
            self.name,
            TenantStatus::parse(self.status.as_str())?,
            self.created_at,
        )
    }
}

impl StoredTenantRow {
    fn into_stored(self) -> AppResult<StoredTenant> {
        let tenant = TenantRow {
            id: self.id,
            name: self.name,
            status: self.status,
            created_at: self.created_at,
        }
        .into_tenant()?;

        Ok(StoredTenant {
            tenant,
            api_key_digest: self.api_key_digest,
            encrypted_provider_credential: self.encrypted_provider_credential,
        })
    }
}

#[async_trait]
impl TenantRepository for PostgresTenantRepository {
    async fn find_by_api_key_digest(
        &self,
        api_key_digest: &str,
    ) -> AppResult<Option<StoredTenant>> {
        let row = sqlx::query_as::<_, StoredTenantRow>(
            r#"
            SELECT id, name, status, created_at, api_key_digest, encrypted_provider_credential
            FROM tenants
            WHERE api_key_digest = $1
            "#,
        )
        .bind(api_key_digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to look up api key: {error}")))?;

        row.map(StoredTenantRow::into_stored).transpose()
    }

    async fn find_tenant(&self, tenant_id: TenantId) -> AppResult<Option<StoredTenant>> {
        let row = sqlx::query_as::<_, StoredTenantRow>(
            r#"
            SELECT id, name, status, created_at, api_key_digest, encrypted_provider_credential
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load tenant '{tenant_id}': {error}"))
        })?;

        row.map(StoredTenantRow::into_stored).transpose()
    }

    async fn create_tenant(&self, tenant: StoredTenant) -> AppResult<()> {
        let tenant_id = tenant.tenant.id();
        let result = sqlx::query(
            r#"
            INSERT INTO tenants (
                id,
                name,
                api_key_digest,
                encrypted_provider_credential,
                status,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(tenant.tenant.name().as_str())
        .bind(tenant.api_key_digest.as_str())
        .bind(tenant.encrypted_provider_credential.as_slice())
        .bind(tenant.tenant.status().as_str())
        .bind(tenant.tenant.created_at())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) => {
                if let sqlx::Error::Database(database_error) = &error
                    && database_error.code().as_deref() == Some("23505")
                {
                    return Err(AppError::Conflict(
                        "api key is already assigned to another tenant".to_owned(),
                    ));
                }

                Err(AppError::Internal(format!(
                    "failed to create tenant '{tenant_id}': {error}"
                )))
            }
        }
    }

    async fn update_status(&self, tenant_id: TenantId, status: TenantStatus) -> AppResult<Tenant> {
        let row = sqlx::query_as::<_, TenantRow>(
            r#"
            UPDATE tenants
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, name, status, created_at
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to update status of tenant '{tenant_id}': {error}"
            ))
        })?
        .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' does not exist")))?;

        row.into_tenant()
    }

    async fn list_tenants(&self) -> AppResult<Vec<Tenant>> {
        let rows = sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT id, name, status, created_at
            FROM tenants
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list tenants: {error}")))?;

        rows.into_iter().map(TenantRow::into_tenant).collect()
    }
}

#[cfg(test)]
mod tests;
