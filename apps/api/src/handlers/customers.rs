use axum::Json;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode};
use paygate_application::TenantContext;
use paygate_domain::ResourceKind;

use crate::dto::{
    CreateCustomerRequest, CustomerResponse, DataEnvelope, ListEnvelope, ListQuery,
    UpdateCustomerRequest,
};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

use super::{created, idempotency_key, many, one, parse_record_id};

pub async fn list_customers_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<ListEnvelope<CustomerResponse>>> {
    let records = state
        .orchestrator
        .list(&context, ResourceKind::Customer, query.into())
        .await?;

    many(records)
}

pub async fn create_customer_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateCustomerRequest>,
) -> ApiResult<(StatusCode, Json<DataEnvelope<CustomerResponse>>)> {
    let outcome = state
        .orchestrator
        .create_customer(&context, idempotency_key(&headers)?, payload.into())
        .await?;

    created(outcome)
}

pub async fn get_customer_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiPath(customer_id): ApiPath<String>,
) -> ApiResult<Json<DataEnvelope<CustomerResponse>>> {
    let record = state
        .orchestrator
        .get(
            &context,
            ResourceKind::Customer,
            parse_record_id(customer_id.as_str())?,
        )
        .await?;

    one(record)
}

pub async fn update_customer_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiPath(customer_id): ApiPath<String>,
    ApiJson(payload): ApiJson<UpdateCustomerRequest>,
) -> ApiResult<Json<DataEnvelope<CustomerResponse>>> {
    let record = state
        .orchestrator
        .update_customer(
            &context,
            parse_record_id(customer_id.as_str())?,
            payload.into(),
        )
        .await?;

    one(record)
}

pub async fn delete_customer_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiPath(customer_id): ApiPath<String>,
) -> ApiResult<Json<DataEnvelope<CustomerResponse>>> {
    let record = state
        .orchestrator
        .cancel(
            &context,
            ResourceKind::Customer,
            parse_record_id(customer_id.as_str())?,
        )
        .await?;

    one(record)
}
