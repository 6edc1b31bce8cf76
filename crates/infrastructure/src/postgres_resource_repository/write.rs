use super::*;

impl PostgresResourceRepository {
    pub(super) async fn allocate_impl(
        &self,
        record: ResourceRecord,
    ) -> AppResult<AllocationOutcome> {
        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO resources (
                id,
                tenant_id,
                kind,
                natural_key,
                request_fingerprint,
                state,
                provider_id,
                parent_id,
                attributes,
                version,
                last_error,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (tenant_id, kind, natural_key) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(record.id().as_uuid())
        .bind(record.tenant_id().as_uuid())
        .bind(record.kind().as_str())
        .bind(record.natural_key())
        .bind(record.request_fingerprint())
        .bind(record.state().as_str())
        .bind(record.provider_id())
        .bind(record.attributes().parent_id().map(|parent_id| parent_id.as_uuid()))
        .bind(Json(record.attributes()))
        .bind(record.version())
        .bind(record.last_error())
        .bind(record.created_at())
        .bind(record.updated_at())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to allocate {} for tenant '{}': {error}",
                record.kind().label(),
                record.tenant_id()
            ))
        })?;

        if inserted.is_some() {
            return Ok(AllocationOutcome::Created(record));
        }

        self.find_by_natural_key_impl(record.tenant_id(), record.kind(), record.natural_key())
            .await?
            .map(AllocationOutcome::Existing)
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "{} allocation conflicted but no record holds the idempotency key",
                    record.kind().label()
                ))
            })
    }

    pub(super) async fn compare_and_set_impl(
        &self,
        current: &ResourceRecord,
        next: &ResourceRecord,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE resources
            SET state = $5,
                provider_id = $6,
                attributes = $7,
                version = $8,
                last_error = $9,
                updated_at = $10
            WHERE id = $1 AND tenant_id = $2 AND state = $3 AND version = $4
            "#,
        )
        .bind(current.id().as_uuid())
        .bind(current.tenant_id().as_uuid())
        .bind(current.state().as_str())
        .bind(current.version())
        .bind(next.state().as_str())
        .bind(next.provider_id())
        .bind(Json(next.attributes()))
        .bind(next.version())
        .bind(next.last_error())
        .bind(next.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to save {} '{}': {error}",
                current.kind().label(),
                current.id()
            ))
        })?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM resources WHERE id = $1 AND tenant_id = $2
            )
            "#,
        )
        .bind(current.id().as_uuid())
        .bind(current.tenant_id().as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to check {} '{}': {error}",
                current.kind().label(),
                current.id()
            ))
        })?;

        if exists {
            Err(AppError::Conflict(format!(
                "{} '{}' was modified concurrently",
                current.kind().label(),
                current.id()
            )))
        } else {
            Err(AppError::NotFound(format!(
                "{} '{}' does not exist",
                current.kind().label(),
                current.id()
            )))
        }
    }
}
