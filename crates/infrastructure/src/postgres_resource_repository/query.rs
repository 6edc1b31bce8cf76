use super::*;

impl PostgresResourceRepository {
    pub(super) async fn find_impl(
        &self,
        tenant_id: TenantId,
        kind: ResourceKind,
        id: RecordId,
    ) -> AppResult<Option<ResourceRecord>> {
        let row = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT id, tenant_id, kind, natural_key, request_fingerprint, state,
                   provider_id, attributes, version, last_error, created_at, updated_at
            FROM resources
            WHERE tenant_id = $1 AND kind = $2 AND id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(kind.as_str())
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find {} '{id}' for tenant '{tenant_id}': {error}",
                kind.label()
            ))
        })?;

        row.map(record_from_row).transpose()
    }

    pub(super) async fn find_by_natural_key_impl(
        &self,
        tenant_id: TenantId,
        kind: ResourceKind,
        natural_key: &str,
    ) -> AppResult<Option<ResourceRecord>> {
        let row = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT id, tenant_id, kind, natural_key, request_fingerprint, state,
                   provider_id, attributes, version, last_error, created_at, updated_at
            FROM resources
            WHERE tenant_id = $1 AND kind = $2 AND natural_key = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(kind.as_str())
        .bind(natural_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load {} by idempotency key for tenant '{tenant_id}': {error}",
                kind.label()
            ))
        })?;

        row.map(record_from_row).transpose()
    }

    pub(super) async fn list_impl(
        &self,
        tenant_id: TenantId,
        kind: ResourceKind,
        query: ResourceListQuery,
    ) -> AppResult<Vec<ResourceRecord>> {
        let rows = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT id, tenant_id, kind, natural_key, request_fingerprint, state,
                   provider_id, attributes, version, last_error, created_at, updated_at
            FROM resources
            WHERE tenant_id = $1
              AND kind = $2
              AND ($3::uuid IS NULL OR parent_id = $3)
            ORDER BY created_at DESC, id
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(kind.as_str())
        .bind(query.parent_id.map(|parent_id| parent_id.as_uuid()))
        .bind(to_sql_limit(query.limit))
        .bind(to_sql_limit(query.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list {} records for tenant '{tenant_id}': {error}",
                kind.label()
            ))
        })?;

        records_from_rows(rows)
    }

    pub(super) async fn list_awaiting_reconciliation_impl(
        &self,
        updated_before: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<ResourceRecord>> {
        let rows = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT id, tenant_id, kind, natural_key, request_fingerprint, state,
                   provider_id, attributes, version, last_error, created_at, updated_at
            FROM resources
            WHERE state IN ('pending', 'cancellation_pending')
              AND updated_at <= $1
            ORDER BY updated_at, id
            LIMIT $2
            "#,
        )
        .bind(updated_before)
        .bind(to_sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list records awaiting reconciliation: {error}"
            ))
        })?;

        records_from_rows(rows)
    }
}
