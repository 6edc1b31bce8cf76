use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paygate_application::{AllocationOutcome, ResourceListQuery, ResourceRepository};
use paygate_core::{AppError, AppResult, TenantId};
use paygate_domain::{RecordId, ResourceKind, ResourceRecord};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct ResourceTables {
    records: HashMap<RecordId, ResourceRecord>,
    natural_keys: HashMap<(TenantId, ResourceKind, String), RecordId>,
}

/// In-memory resource store for development and tests.
///
/// Allocation holds the write lock only for the create-or-fetch decision.
#[derive(Debug, Default)]
pub struct InMemoryResourceRepository {
    tables: RwLock<ResourceTables>,
}

impl InMemoryResourceRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceRepository for InMemoryResourceRepository {
    async fn allocate(&self, record: ResourceRecord) -> AppResult<AllocationOutcome> {
        let mut tables = self.tables.write().await;
        let natural_key = (
            record.tenant_id(),
            record.kind(),
            record.natural_key().to_owned(),
        );

        if let Some(existing) = tables
            .natural_keys
            .get(&natural_key)
            .and_then(|id| tables.records.get(id))
        {
            return Ok(AllocationOutcome::Existing(existing.clone()));
        }

        tables.natural_keys.insert(natural_key, record.id());
        tables.records.insert(record.id(), record.clone());
        Ok(AllocationOutcome::Created(record))
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        kind: ResourceKind,
        id: RecordId,
    ) -> AppResult<Option<ResourceRecord>> {
        Ok(self
            .tables
            .read()
            .await
            .records
            .get(&id)
            .filter(|record| record.tenant_id() == tenant_id && record.kind() == kind)
            .cloned())
    }

    async fn find_by_natural_key(
        &self,
        tenant_id: TenantId,
        kind: ResourceKind,
        natural_key: &str,
    ) -> AppResult<Option<ResourceRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .natural_keys
            .get(&(tenant_id, kind, natural_key.to_owned()))
            .and_then(|id| tables.records.get(id))
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        kind: ResourceKind,
        query: ResourceListQuery,
    ) -> AppResult<Vec<ResourceRecord>> {
        let tables = self.tables.read().await;
        let mut records: Vec<&ResourceRecord> = tables
            .records
            .values()
            .filter(|record| record.tenant_id() == tenant_id && record.kind() == kind)
            .filter(|record| {
                query
                    .parent_id
                    .is_none_or(|parent_id| record.attributes().parent_id() == Some(parent_id))
            })
            .collect();
        records.sort_by_key(|record| (Reverse(record.created_at()), record.id()));

        Ok(records
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn compare_and_set(
        &self,
        current: &ResourceRecord,
        next: &ResourceRecord,
    ) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .records
            .get_mut(&current.id())
            .filter(|stored| stored.tenant_id() == current.tenant_id())
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "{} '{}' does not exist",
                    current.kind().label(),
                    current.id()
                ))
            })?;

        if stored.state() != current.state() || stored.version() != current.version() {
            return Err(AppError::Conflict(format!(
                "{} '{}' was modified concurrently",
                current.kind().label(),
                current.id()
            )));
        }

        *stored = next.clone();
        Ok(())
    }

    async fn list_awaiting_reconciliation(
        &self,
        updated_before: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<ResourceRecord>> {
        let tables = self.tables.read().await;
        let mut records: Vec<&ResourceRecord> = tables
            .records
            .values()
            .filter(|record| record.state().awaits_reconciliation())
            .filter(|record| record.updated_at() <= updated_before)
            .collect();
        records.sort_by_key(|record| record.updated_at());

        Ok(records.into_iter().take(limit).cloned().collect())
    }
}
