//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`. The client always receives `{"message": ...}`;
//! internal detail stays in the logs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::email::EmailError;
use crate::services::orders::OrderError;
use crate::services::ratings::RatingError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order processing failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Rating operation failed.
    #[error("Rating error: {0}")]
    Rating(#[from] RatingError),

    /// Outbound mail failed.
    #[error("Mail error: {0}")]
    Mail(#[from] EmailError),

    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or invalid session.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate unique field.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl AppError {
    /// Status code and client-safe message for this error.
    ///
    /// Duplicate-field conflicts answer 400, not 409 - the deployed
    /// clients check for 400 on duplicate registration.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
                RepositoryError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                _ => internal(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_) => (
                    StatusCode::BAD_REQUEST,
                    "Please enter a valid email".to_string(),
                ),
                AuthError::InvalidCredentials => {
                    (StatusCode::BAD_REQUEST, "Invalid credentials".to_string())
                }
                AuthError::UserAlreadyExists => {
                    (StatusCode::BAD_REQUEST, "User already exists".to_string())
                }
                AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                AuthError::MissingName => {
                    (StatusCode::BAD_REQUEST, "Name is required".to_string())
                }
                AuthError::AdminOnly => (
                    StatusCode::FORBIDDEN,
                    "Access denied. Admin privileges required".to_string(),
                ),
                AuthError::InvalidOrExpiredToken => (
                    StatusCode::BAD_REQUEST,
                    "Invalid or expired token".to_string(),
                ),
                AuthError::Token(_) => (
                    StatusCode::UNAUTHORIZED,
                    "Authentication failed".to_string(),
                ),
                AuthError::UserNotFound => {
                    (StatusCode::NOT_FOUND, "User not found".to_string())
                }
                _ => internal(),
            },
            Self::Order(err) => match err {
                OrderError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                OrderError::NotFound => {
                    (StatusCode::NOT_FOUND, "Order not found".to_string())
                }
                OrderError::Repository(_) => internal(),
            },
            Self::Rating(err) => match err {
                RatingError::InvalidRating => (
                    StatusCode::BAD_REQUEST,
                    "Rating must be between 1 and 5".to_string(),
                ),
                RatingError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
                RatingError::Repository(_) => internal(),
            },
            Self::Mail(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to send message".to_string(),
            ),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Internal(_) => internal(),
        }
    }
}

/// The suppressed-detail 500 answer.
fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Server error".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(ErrorBody { message })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.status_and_message().0
    }

    #[test]
    fn test_taxonomy_status_codes() {
        assert_eq!(
            status_of(AppError::Validation("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Unauthorized("no token".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Forbidden("admins only".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AppError::NotFound("gone".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_conflict_maps_to_400_for_wire_parity() {
        assert_eq!(
            status_of(AppError::Conflict("email taken".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Auth(AuthError::UserAlreadyExists)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_detail_is_suppressed() {
        let (_, message) =
            AppError::Internal("connection pool exhausted".to_string()).status_and_message();
        assert_eq!(message, "Server error");

        let (_, message) = AppError::Database(RepositoryError::DataCorruption(
            "bad row 42".to_string(),
        ))
        .status_and_message();
        assert_eq!(message, "Server error");
    }

    #[test]
    fn test_order_validation_passes_message_through() {
        let (status, message) =
            AppError::Order(OrderError::Validation("Items are required".to_string()))
                .status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Items are required");
    }

    #[test]
    fn test_invalid_session_is_401() {
        use crate::services::tokens::TokenError;
        assert_eq!(
            status_of(AppError::Auth(AuthError::Token(TokenError::Validation(
                "expired".to_string()
            )))),
            StatusCode::UNAUTHORIZED
        );
    }
}
