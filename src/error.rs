//! Error handling for the API.
//!
//! Prefer adding a variant to [`PickupError`] over squeezing a new kind of
//! failure into `BadRequest` or `Server`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// The error enum for all error handling across the API.
///
/// Every variant is rendered as
///
/// ```json
/// { "error": <message> }
/// ```
///
/// with the status code noted on the variant.
#[derive(Debug, thiserror::Error)]
pub enum PickupError {
    /// \[400\] The request was malformed or failed validation.
    #[error("{0}")]
    BadRequest(String),
    /// \[401\] The endpoint requires a logged-in, verified user.
    #[error("{0}")]
    Unauthorized(String),
    /// \[403\] The current user may not perform this action.
    #[error("{0}")]
    Forbidden(String),
    /// \[404\] The requested resource does not exist.
    #[error("{0}")]
    NotFound(String),
    /// \[500\] An error occured while interacting with the database.
    ///
    /// The underlying error is logged, never sent to the client.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// \[500\] Something else went wrong while handling the request.
    #[error("server error: {0}")]
    Server(String),
}

/// The return type for all endpoints.
pub type PickupResult<T> = Result<T, PickupError>;

impl PickupError {
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::BadRequest(reason.into())
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound(reason.into())
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized(reason.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PickupError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PickupError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            PickupError::Forbidden(_) => StatusCode::FORBIDDEN,
            PickupError::NotFound(_) => StatusCode::NOT_FOUND,
            PickupError::Database(_) | PickupError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for PickupError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
