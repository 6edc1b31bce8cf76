use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paygate_application::{AllocationOutcome, ResourceListQuery, ResourceRepository};
use paygate_core::{AppError, AppResult, TenantId};
use paygate_domain::{
    RecordId, RecordState, ResourceAttributes, ResourceKind, ResourceRecord, StoredResourceRecord,
};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

mod query;
mod write;

/// PostgreSQL-backed local resource store.
#[derive(Clone)]
pub struct PostgresResourceRepository {
    pool: PgPool,
}

impl PostgresResourceRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ResourceRow {
    id: Uuid,
    tenant_id: Uuid,
    kind: String,
    natural_key: String,
    request_fingerprint: String,
    state: String,
    provider_id: Option<String>,
    attributes: Json<ResourceAttributes>,
    version: i64,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn record_from_row(row: ResourceRow) -> AppResult<ResourceRecord> {
    let kind = ResourceKind::parse(row.kind.as_str())?;
    let attributes = row.attributes.0;
    if attributes.kind() != kind {
        return Err(AppError::Internal(format!(
            "resource '{}' is stored as {} but carries {} attributes",
            row.id,
            kind,
            attributes.kind()
        )));
    }

    Ok(ResourceRecord::restore(StoredResourceRecord {
        id: RecordId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        natural_key: row.natural_key,
        request_fingerprint: row.request_fingerprint,
        state: RecordState::parse(row.state.as_str())?,
        provider_id: row.provider_id,
        attributes,
        version: row.version,
        last_error: row.last_error,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn records_from_rows(rows: Vec<ResourceRow>) -> AppResult<Vec<ResourceRecord>> {
    rows.into_iter().map(record_from_row).collect()
}

fn to_sql_limit(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl ResourceRepository for PostgresResourceRepository {
    async fn allocate(&self, record: ResourceRecord) -> AppResult<AllocationOutcome> {
        self.allocate_impl(record).await
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        kind: ResourceKind,
        id: RecordId,
    ) -> AppResult<Option<ResourceRecord>> {
        self.find_impl(tenant_id, kind, id).await
    }

    async fn find_by_natural_key(
        &self,
        tenant_id: TenantId,
        kind: ResourceKind,
        natural_key: &str,
    ) -> AppResult<Option<ResourceRecord>> {
        self.find_by_natural_key_impl(tenant_id, kind, natural_key)
            .await
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        kind: ResourceKind,
        query: ResourceListQuery,
    ) -> AppResult<Vec<ResourceRecord>> {
        self.list_impl(tenant_id, kind, query).await
    }

    async fn compare_and_set(
        &self,
        current: &ResourceRecord,
        next: &ResourceRecord,
    ) -> AppResult<()> {
        self.compare_and_set_impl(current, next).await
    }

    async fn list_awaiting_reconciliation(
        &self,
        updated_before: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<ResourceRecord>> {
        self.list_awaiting_reconciliation_impl(updated_before, limit)
            .await
    }
}
