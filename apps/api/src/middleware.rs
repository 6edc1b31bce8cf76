use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;
use paygate_application::digests_match;
use paygate_core::{AppError, AuthError};
use tracing::warn;

use crate::error::{ApiResult, request_timeout_response};
use crate::state::AppState;

/// Resolves the bearer API key to a tenant and stores the `TenantContext`
/// as a request extension.
pub async fn require_tenant(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let context = state
        .tenant_resolver
        .resolve(bearer_token(request.headers()))
        .await?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let presented = bearer_token(request.headers()).unwrap_or_default();
    if !digests_match(presented, state.admin_token.as_str()) {
        warn!(path = %request.uri().path(), "rejected admin request");
        return Err(AppError::Auth(AuthError::Missing).into());
    }

    Ok(next.run(request).await)
}

/// Replaces the empty `408` produced by the timeout layer with the failure
/// envelope.
pub async fn envelope_request_timeout(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return request_timeout_response();
    }

    response
}

/// Returns the credential of an `Authorization: Bearer <token>` header.
/// Any other scheme counts as no credential.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then_some(token.trim())
}
