use axum::Json;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode};
use paygate_application::{ResourceListQuery, TenantContext};
use paygate_domain::ResourceKind;

use crate::dto::{
    CreateSubscriptionItemRequest, DataEnvelope, ListEnvelope, SubscriptionItemListQuery,
    SubscriptionItemResponse, UpdateSubscriptionItemRequest,
};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

use super::{created, idempotency_key, many, one, parse_record_id};

pub async fn list_subscription_items_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiQuery(query): ApiQuery<SubscriptionItemListQuery>,
) -> ApiResult<Json<ListEnvelope<SubscriptionItemResponse>>> {
    let subscription_id = query
        .subscription_id
        .as_deref()
        .map(parse_record_id)
        .transpose()?;
    let list_query =
        ResourceListQuery::from_paging(query.limit, query.offset).with_parent(subscription_id);

    let records = state
        .orchestrator
        .list(&context, ResourceKind::SubscriptionItem, list_query)
        .await?;

    many(records)
}

pub async fn create_subscription_item_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateSubscriptionItemRequest>,
) -> ApiResult<(StatusCode, Json<DataEnvelope<SubscriptionItemResponse>>)> {
    let outcome = state
        .orchestrator
        .create_subscription_item(&context, idempotency_key(&headers)?, payload.try_into()?)
        .await?;

    created(outcome)
}

pub async fn get_subscription_item_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiPath(item_id): ApiPath<String>,
) -> ApiResult<Json<DataEnvelope<SubscriptionItemResponse>>> {
    let record = state
        .orchestrator
        .get(
            &context,
            ResourceKind::SubscriptionItem,
            parse_record_id(item_id.as_str())?,
        )
        .await?;

    one(record)
}

pub async fn update_subscription_item_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiPath(item_id): ApiPath<String>,
    ApiJson(payload): ApiJson<UpdateSubscriptionItemRequest>,
) -> ApiResult<Json<DataEnvelope<SubscriptionItemResponse>>> {
    let record = state
        .orchestrator
        .update_subscription_item(&context, parse_record_id(item_id.as_str())?, payload.into())
        .await?;

    one(record)
}

pub async fn delete_subscription_item_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiPath(item_id): ApiPath<String>,
) -> ApiResult<Json<DataEnvelope<SubscriptionItemResponse>>> {
    let record = state
        .orchestrator
        .cancel(
            &context,
            ResourceKind::SubscriptionItem,
            parse_record_id(item_id.as_str())?,
        )
        .await?;

    one(record)
}
