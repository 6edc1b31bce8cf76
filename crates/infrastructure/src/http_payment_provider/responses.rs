use std::time::Duration;

use paygate_application::ProviderObject;
use paygate_core::ProviderError;
use paygate_domain::{ResourceKind, SetupIntentStatus, SubscriptionStatus};
use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RemoteObject {
    id: String,
    #[serde(default)]
    deleted: bool,
    status: Option<String>,
    cancel_at_period_end: Option<bool>,
    quantity: Option<u32>,
    client_secret: Option<String>,
    active: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
}

pub(super) fn object_from_body(kind: ResourceKind, body: &str) -> Result<ProviderObject, ProviderError> {
    let remote: RemoteObject = serde_json::from_str(body).map_err(|error| {
        ProviderError::Transient(format!(
            "provider returned an unreadable {} object: {error}",
            kind.label()
        ))
    })?;

    if remote.deleted {
        return Ok(ProviderObject::Deleted {
            kind,
            id: remote.id,
        });
    }

    let object = match kind {
        ResourceKind::Customer => ProviderObject::Customer { id: remote.id },
        ResourceKind::Subscription => ProviderObject::Subscription {
            status: SubscriptionStatus::from_provider(required(kind, "status", remote.status)?.as_str()),
            cancel_at_period_end: remote.cancel_at_period_end.unwrap_or(false),
            id: remote.id,
        },
        ResourceKind::SubscriptionItem => ProviderObject::SubscriptionItem {
            quantity: remote.quantity.unwrap_or(0),
            id: remote.id,
        },
        ResourceKind::SetupIntent => ProviderObject::SetupIntent {
            status: SetupIntentStatus::from_provider(required(kind, "status", remote.status)?.as_str()),
            client_secret: remote.client_secret,
            id: remote.id,
        },
        ResourceKind::TaxRate => ProviderObject::TaxRate {
            active: required(kind, "active", remote.active)?,
            id: remote.id,
        },
    };

    Ok(object)
}

fn required<T>(kind: ResourceKind, field: &str, value: Option<T>) -> Result<T, ProviderError> {
    value.ok_or_else(|| {
        ProviderError::Transient(format!(
            "provider {} response is missing '{field}'",
            kind.label()
        ))
    })
}

pub(super) fn error_from_response(
    status: StatusCode,
    retry_after: Option<&str>,
    body: &str,
) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthRejected,
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
            retry_after: retry_after
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        },
        // An earlier request with the same idempotency key is still running.
        StatusCode::CONFLICT => {
            ProviderError::Transient(format!("provider reported a conflict: {}", error_message(status, body)))
        }
        status if status.is_server_error() => {
            ProviderError::Transient(format!("provider returned {status}"))
        }
        status => ProviderError::InvalidRequest(error_message(status, body)),
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: ErrorBody {
                message: Some(message),
                ..
            },
        }) => message,
        Ok(ErrorEnvelope {
            error: ErrorBody {
                code: Some(code), ..
            },
        }) => code,
        _ => format!("provider returned {status}"),
    }
}
