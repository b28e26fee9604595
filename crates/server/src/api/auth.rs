use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use super::error::ApiError;
use super::ApiState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Rejects `/api` requests whose `X-API-KEY` header does not name a
/// configured user. The authenticated user rides along as an extension.
pub async fn require_api_key(
    State(state): State<ApiState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let api_key = request
        .headers()
        .get(API_KEY_HEADER)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    let user = state.authenticator.authenticate(api_key.as_deref())?;
    debug!(
        event_name = "api.request.authenticated",
        username = %user.username,
        path = %request.uri().path(),
        "request authenticated"
    );

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
