use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use paygate_core::{AppError, AuthError, ProviderError};
use serde::Serialize;
use tracing::error;

/// Failure envelope returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    success: bool,
    error: &'static str,
    message: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(AppError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::Validation(rejection.body_text()))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::Auth(AuthError::Missing | AuthError::NotFound) => StatusCode::UNAUTHORIZED,
            AppError::Auth(AuthError::Suspended) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Provider(ProviderError::Transient(_) | ProviderError::RateLimited { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Provider(ProviderError::InvalidRequest(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Provider(ProviderError::AuthRejected) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            AppError::Internal(detail) => {
                error!(error = %detail, "request failed with internal error");
                "internal server error".to_owned()
            }
            other => other.to_string(),
        };

        let payload = Json(ErrorResponse {
            success: false,
            error: self.0.kind(),
            message,
        });
        let mut response = (status, payload).into_response();

        if let AppError::Provider(provider_error) = &self.0
            && let Some(retry_after) = provider_error.retry_after()
        {
            let seconds = retry_after.as_secs().max(1).to_string();
            if let Ok(value) = HeaderValue::from_str(seconds.as_str()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

/// Failure envelope for a request cut off by the request timeout layer.
///
/// Remote work already issued is left `pending` for reconciliation.
pub fn request_timeout_response() -> Response {
    let payload = Json(ErrorResponse {
        success: false,
        error: "RequestTimeout",
        message: "request did not complete in time; retry with the same Idempotency-Key"
            .to_owned(),
    });

    (StatusCode::REQUEST_TIMEOUT, payload).into_response()
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
