use axum::Json;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode};
use paygate_application::TenantContext;
use paygate_domain::ResourceKind;

use crate::dto::{
    CreateSetupIntentRequest, DataEnvelope, ListEnvelope, ListQuery, SetupIntentResponse,
};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

use super::{created, idempotency_key, many, one, parse_record_id};

pub async fn list_setup_intents_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<ListEnvelope<SetupIntentResponse>>> {
    let records = state
        .orchestrator
        .list(&context, ResourceKind::SetupIntent, query.into())
        .await?;

    many(records)
}

pub async fn create_setup_intent_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateSetupIntentRequest>,
) -> ApiResult<(StatusCode, Json<DataEnvelope<SetupIntentResponse>>)> {
    let outcome = state
        .orchestrator
        .create_setup_intent(&context, idempotency_key(&headers)?, payload.try_into()?)
        .await?;

    created(outcome)
}

pub async fn get_setup_intent_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiPath(setup_intent_id): ApiPath<String>,
) -> ApiResult<Json<DataEnvelope<SetupIntentResponse>>> {
    let record = state
        .orchestrator
        .get(
            &context,
            ResourceKind::SetupIntent,
            parse_record_id(setup_intent_id.as_str())?,
        )
        .await?;

    one(record)
}

pub async fn cancel_setup_intent_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiPath(setup_intent_id): ApiPath<String>,
) -> ApiResult<Json<DataEnvelope<SetupIntentResponse>>> {
    let record = state
        .orchestrator
        .cancel(
            &context,
            ResourceKind::SetupIntent,
            parse_record_id(setup_intent_id.as_str())?,
        )
        .await?;

    one(record)
}

pub async fn sync_setup_intent_handler(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    ApiPath(setup_intent_id): ApiPath<String>,
) -> ApiResult<Json<DataEnvelope<SetupIntentResponse>>> {
    let record = state
        .orchestrator
        .sync_setup_intent(&context, parse_record_id(setup_intent_id.as_str())?)
        .await?;

    one(record)
}
