use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use paygate_core::TenantId;

use crate::dto::{
    CreateTenantRequest, DataEnvelope, ListEnvelope, ProvisionedTenantResponse, TenantResponse,
};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

pub async fn list_tenants_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<ListEnvelope<TenantResponse>>> {
    let tenants = state
        .tenant_admin_service
        .list_tenants()
        .await?
        .into_iter()
        .map(TenantResponse::from)
        .collect();

    Ok(Json(ListEnvelope::new(tenants)))
}

pub async fn create_tenant_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateTenantRequest>,
) -> ApiResult<(StatusCode, Json<DataEnvelope<ProvisionedTenantResponse>>)> {
    let provisioned = state
        .tenant_admin_service
        .provision_tenant(payload.try_into()?)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataEnvelope::new(ProvisionedTenantResponse::from(provisioned))),
    ))
}

pub async fn suspend_tenant_handler(
    State(state): State<AppState>,
    ApiPath(tenant_id): ApiPath<String>,
) -> ApiResult<Json<DataEnvelope<TenantResponse>>> {
    let tenant = state
        .tenant_admin_service
        .suspend_tenant(TenantId::parse(tenant_id.as_str())?)
        .await?;

    Ok(Json(DataEnvelope::new(TenantResponse::from(tenant))))
}

pub async fn reactivate_tenant_handler(
    State(state): State<AppState>,
    ApiPath(tenant_id): ApiPath<String>,
) -> ApiResult<Json<DataEnvelope<TenantResponse>>> {
    let tenant = state
        .tenant_admin_service
        .reactivate_tenant(TenantId::parse(tenant_id.as_str())?)
        .await?;

    Ok(Json(DataEnvelope::new(TenantResponse::from(tenant))))
}
