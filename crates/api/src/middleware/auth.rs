//! Authentication extractors.
//!
//! Provides extractors for requiring a bearer-token session (and
//! optionally the admin role) in route handlers.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::models::user::User;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Extractor that requires a valid `Authorization: Bearer <token>` header.
///
/// The token is verified and resolved to the live user record; a token
/// for a since-deleted account is rejected.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(AuthUser(user): AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct AuthUser(pub User);

/// Extractor that additionally requires the admin role.
pub struct AdminUser(pub User);

/// Error returned when authentication or authorization fails.
pub enum AuthRejection {
    /// No bearer token on the request.
    MissingToken,
    /// Token valid but the account behind it no longer exists.
    UnknownUser,
    /// Token malformed, tampered with, or expired.
    Failed,
    /// Authenticated, but not an admin.
    NotAdmin,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "Authentication required"),
            Self::UnknownUser => (StatusCode::UNAUTHORIZED, "Invalid token"),
            Self::Failed => (StatusCode::UNAUTHORIZED, "Authentication failed"),
            Self::NotAdmin => (
                StatusCode::FORBIDDEN,
                "Access denied. Admin privileges required",
            ),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = bearer_token(parts).ok_or(AuthRejection::MissingToken)?;

        let auth = AuthService::new(state.pool(), state.tokens());
        let user = match auth.verify_session(token).await {
            Ok(user) => user,
            Err(AuthError::UserNotFound) => return Err(AuthRejection::UnknownUser),
            Err(e) => {
                tracing::debug!(error = %e, "Session verification failed");
                return Err(AuthRejection::Failed);
            }
        };

        // Associate subsequent Sentry events with the caller.
        sentry::configure_scope(|scope| {
            scope.set_user(Some(sentry::User {
                id: Some(user.id.to_string()),
                email: Some(user.email.as_str().to_owned()),
                ..Default::default()
            }));
        });

        Ok(Self(user))
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if !user.role.is_admin() {
            return Err(AuthRejection::NotAdmin);
        }

        Ok(Self(user))
    }
}

/// Pull the bearer token out of the Authorization header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/orders");
        if let Some(v) = value {
            builder = builder.header(AUTHORIZATION, v);
        }
        let (parts, ()) = builder.body(()).expect("request builds").into_parts();
        parts
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_header_is_none() {
        let parts = parts_with_auth(None);
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn test_wrong_scheme_is_none() {
        let parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn test_empty_token_is_none() {
        let parts = parts_with_auth(Some("Bearer "));
        assert_eq!(bearer_token(&parts), None);
    }
}
