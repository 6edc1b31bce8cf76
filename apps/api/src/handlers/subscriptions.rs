use axum::Json;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode};
use paygate_application::TenantContext;
use paygate_domain::ResourceKind;

use crate::dto::{
    CreateSubscriptionRequest, DataEnvelope, ListEnvelope, ListQuery, SubscriptionResponse,
    UpdateSubscriptionRequest,
};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

use super::{created, idempotency_key, many, one, parse_record_id};

pub async fn list_subscriptions_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<ListEnvelope<SubscriptionResponse>>> {
    let records = state
        .orchestrator
        .list(&context, ResourceKind::Subscription, query.into())
        .await?;

    many(records)
}

pub async fn create_subscription_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateSubscriptionRequest>,
) -> ApiResult<(StatusCode, Json<DataEnvelope<SubscriptionResponse>>)> {
    let outcome = state
        .orchestrator
        .create_subscription(&context, idempotency_key(&headers)?, payload.try_into()?)
        .await?;

    created(outcome)
}

pub async fn get_subscription_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiPath(subscription_id): ApiPath<String>,
) -> ApiResult<Json<DataEnvelope<SubscriptionResponse>>> {
    let record = state
        .orchestrator
        .get(
            &context,
            ResourceKind::Subscription,
            parse_record_id(subscription_id.as_str())?,
        )
        .await?;

    one(record)
}

pub async fn update_subscription_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiPath(subscription_id): ApiPath<String>,
    ApiJson(payload): ApiJson<UpdateSubscriptionRequest>,
) -> ApiResult<Json<DataEnvelope<SubscriptionResponse>>> {
    let record = state
        .orchestrator
        .update_subscription(
            &context,
            parse_record_id(subscription_id.as_str())?,
            payload.into(),
        )
        .await?;

    one(record)
}

pub async fn cancel_subscription_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiPath(subscription_id): ApiPath<String>,
) -> ApiResult<Json<DataEnvelope<SubscriptionResponse>>> {
    let record = state
        .orchestrator
        .cancel(
            &context,
            ResourceKind::Subscription,
            parse_record_id(subscription_id.as_str())?,
        )
        .await?;

    one(record)
}

pub async fn sync_subscription_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiPath(subscription_id): ApiPath<String>,
) -> ApiResult<Json<DataEnvelope<SubscriptionResponse>>> {
    let record = state
        .orchestrator
        .sync_subscription(&context, parse_record_id(subscription_id.as_str())?)
        .await?;

    one(record)
}
