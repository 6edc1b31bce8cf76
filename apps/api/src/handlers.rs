pub mod admin;
pub mod customers;
pub mod health;
pub mod setup_intents;
pub mod subscription_items;
pub mod subscriptions;
pub mod tax_rates;

use axum::Json;
use axum::http::{HeaderMap, StatusCode};
use paygate_application::{CreateDisposition, CreateOutcome};
use paygate_core::AppError;
use paygate_domain::{RecordId, ResourceRecord};

use crate::dto::{DataEnvelope, ListEnvelope};
use crate::error::ApiResult;

const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Reads the optional `Idempotency-Key` header used as the natural key.
pub(crate) fn idempotency_key(headers: &HeaderMap) -> ApiResult<Option<&str>> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| {
        AppError::Validation("Idempotency-Key header must be visible ASCII".to_owned())
    })?;
    Ok(Some(value.trim()).filter(|value| !value.is_empty()))
}

pub(crate) fn parse_record_id(value: &str) -> ApiResult<RecordId> {
    Ok(RecordId::parse(value)?)
}

/// Maps a create outcome to `201`, `200` for a settled replay or `202` for
/// a replay that is still in flight.
pub(crate) fn created<T>(outcome: CreateOutcome) -> ApiResult<(StatusCode, Json<DataEnvelope<T>>)>
where
    T: TryFrom<ResourceRecord, Error = AppError>,
{
    let status = match outcome.disposition {
        CreateDisposition::Created => StatusCode::CREATED,
        CreateDisposition::Replayed => StatusCode::OK,
        CreateDisposition::InFlight => StatusCode::ACCEPTED,
    };

    Ok((status, Json(DataEnvelope::new(T::try_from(outcome.record)?))))
}

pub(crate) fn one<T>(record: ResourceRecord) -> ApiResult<Json<DataEnvelope<T>>>
where
    T: TryFrom<ResourceRecord, Error = AppError>,
{
    Ok(Json(DataEnvelope::new(T::try_from(record)?)))
}

pub(crate) fn many<T>(records: Vec<ResourceRecord>) -> ApiResult<Json<ListEnvelope<T>>>
where
    T: TryFrom<ResourceRecord, Error = AppError>,
{
    let data = records
        .into_iter()
        .map(T::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ListEnvelope::new(data)))
}
