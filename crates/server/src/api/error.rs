use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error};
use uuid::Uuid;

use pizzeria_core::errors::{ApplicationError, InterfaceError, ValidationError};
use pizzeria_core::validation::messages;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Boundary error: every failure leaves the API as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl ApiError {
    pub fn malformed_body() -> Self {
        ValidationError::new("body", messages::MALFORMED_BODY).into()
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        Self(error.into_interface(Uuid::new_v4().to_string()))
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApplicationError::from(error).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.0 {
            InterfaceError::Internal { message, correlation_id } => {
                error!(
                    event_name = "api.request.internal_error",
                    correlation_id = %correlation_id,
                    error = %message,
                    "request failed with an internal error"
                );
            }
            other => {
                debug!(
                    event_name = "api.request.rejected",
                    correlation_id = %other.correlation_id(),
                    status = status.as_u16(),
                    error = %other.user_message(),
                    "request rejected"
                );
            }
        }

        (status, Json(ErrorBody { error: self.0.user_message().to_owned() })).into_response()
    }
}
