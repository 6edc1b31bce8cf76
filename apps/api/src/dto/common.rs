use chrono::{DateTime, Utc};
use paygate_application::ResourceListQuery;
use paygate_core::AppError;
use paygate_domain::{ResourceKind, ResourceRecord};
use serde::{Deserialize, Serialize};

/// Success envelope for a single object.
#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Success envelope for a collection.
#[derive(Debug, Serialize)]
pub struct ListEnvelope<T> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> ListEnvelope<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

/// Paging parameters accepted by list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl From<ListQuery> for ResourceListQuery {
    fn from(query: ListQuery) -> Self {
        ResourceListQuery::from_paging(query.limit, query.offset)
    }
}

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: HealthDependencyStatus,
}

/// One runtime dependency health status.
#[derive(Debug, Serialize)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

/// Local lifecycle fields shared by every resource response.
#[derive(Debug, Serialize)]
pub struct RecordStatusResponse {
    pub state: &'static str,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ResourceRecord> for RecordStatusResponse {
    fn from(record: &ResourceRecord) -> Self {
        Self {
            state: record.state().as_str(),
            last_error: record.last_error().map(ToOwned::to_owned),
            created_at: record.created_at(),
            updated_at: record.updated_at(),
        }
    }
}

pub(super) fn unexpected_attributes(record: &ResourceRecord, expected: ResourceKind) -> AppError {
    AppError::Internal(format!(
        "record '{}' holds {} attributes where {} was expected",
        record.id(),
        record.kind(),
        expected
    ))
}
