use async_trait::async_trait;
use chrono::{DateTime, Utc};

use paygate_core::{AppResult, TenantId};
use paygate_domain::{RecordId, ResourceKind, ResourceRecord};

/// Default page size for list queries.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Largest accepted page size for list queries.
pub const MAX_LIST_LIMIT: usize = 200;

/// Result of an atomic create-or-fetch allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationOutcome {
    /// The record was inserted in `pending`.
    Created(ResourceRecord),
    /// A record with the same natural key already existed and was left untouched.
    Existing(ResourceRecord),
}

/// Paging and filter options for record listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceListQuery {
    /// Maximum number of records to return.
    pub limit: usize,
    /// Number of records to skip.
    pub offset: usize,
    /// Only return records hanging off this parent record.
    pub parent_id: Option<RecordId>,
}

impl Default for ResourceListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
            parent_id: None,
        }
    }
}

impl ResourceListQuery {
    /// Builds a query from optional caller input, clamping the page size.
    #[must_use]
    pub fn from_paging(limit: Option<usize>, offset: Option<usize>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT),
            offset: offset.unwrap_or(0),
            parent_id: None,
        }
    }

    /// Restricts the query to children of a parent record.
    #[must_use]
    pub fn with_parent(self, parent_id: Option<RecordId>) -> Self {
        Self { parent_id, ..self }
    }
}

/// Repository port for tenant-scoped resource records.
///
/// Every read takes the tenant id so that isolation is enforced by storage.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Inserts a pending record unless one already exists for the same
    /// `(tenant_id, kind, natural_key)`.
    async fn allocate(&self, record: ResourceRecord) -> AppResult<AllocationOutcome>;

    /// Finds one record owned by the tenant.
    async fn find(
        &self,
        tenant_id: TenantId,
        kind: ResourceKind,
        id: RecordId,
    ) -> AppResult<Option<ResourceRecord>>;

    /// Finds the record holding a natural key, if any.
    async fn find_by_natural_key(
        &self,
        tenant_id: TenantId,
        kind: ResourceKind,
        natural_key: &str,
    ) -> AppResult<Option<ResourceRecord>>;

    /// Lists records of one kind owned by the tenant, newest first.
    async fn list(
        &self,
        tenant_id: TenantId,
        kind: ResourceKind,
        query: ResourceListQuery,
    ) -> AppResult<Vec<ResourceRecord>>;

    /// Replaces `current` with `next` if `current` is still the stored revision.
    ///
    /// Fails with `Conflict` when the stored state or version moved on.
    async fn compare_and_set(&self, current: &ResourceRecord, next: &ResourceRecord)
    -> AppResult<()>;

    /// Lists `pending` and `cancellation_pending` records across tenants last
    /// written before `updated_before`, oldest first.
    async fn list_awaiting_reconciliation(
        &self,
        updated_before: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<ResourceRecord>>;
}
