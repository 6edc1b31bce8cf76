use axum::Json;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode};
use paygate_application::TenantContext;
use paygate_domain::ResourceKind;

use crate::dto::{
    CreateTaxRateRequest, DataEnvelope, ListEnvelope, ListQuery, TaxRateResponse,
    UpdateTaxRateRequest,
};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

use super::{created, idempotency_key, many, one, parse_record_id};

pub async fn list_tax_rates_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<ListEnvelope<TaxRateResponse>>> {
    let records = state
        .orchestrator
        .list(&context, ResourceKind::TaxRate, query.into())
        .await?;

    many(records)
}

pub async fn create_tax_rate_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateTaxRateRequest>,
) -> ApiResult<(StatusCode, Json<DataEnvelope<TaxRateResponse>>)> {
    let outcome = state
        .orchestrator
        .create_tax_rate(&context, idempotency_key(&headers)?, payload.into())
        .await?;

    created(outcome)
}

pub async fn get_tax_rate_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiPath(tax_rate_id): ApiPath<String>,
) -> ApiResult<Json<DataEnvelope<TaxRateResponse>>> {
    let record = state
        .orchestrator
        .get(
            &context,
            ResourceKind::TaxRate,
            parse_record_id(tax_rate_id.as_str())?,
        )
        .await?;

    one(record)
}

pub async fn update_tax_rate_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiPath(tax_rate_id): ApiPath<String>,
    ApiJson(payload): ApiJson<UpdateTaxRateRequest>,
) -> ApiResult<Json<DataEnvelope<TaxRateResponse>>> {
    let record = state
        .orchestrator
        .update_tax_rate(&context, parse_record_id(tax_rate_id.as_str())?, payload.into())
        .await?;

    one(record)
}

/// Tax rates cannot be deleted remotely; this deactivates them.
pub async fn delete_tax_rate_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiPath(tax_rate_id): ApiPath<String>,
) -> ApiResult<Json<DataEnvelope<TaxRateResponse>>> {
    let record = state
        .orchestrator
        .cancel(
            &context,
            ResourceKind::TaxRate,
            parse_record_id(tax_rate_id.as_str())?,
        )
        .await?;

    one(record)
}
