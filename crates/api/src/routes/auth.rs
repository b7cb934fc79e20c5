//! Authentication route handlers.
//!
//! Registration, login, token validation/refresh, and the password-reset
//! flow.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::user::{PublicUser, UserDetail};
use crate::services::auth::{AuthError, AuthService};
use crate::services::tokens::TokenFlow;
use crate::state::AppState;

/// The forgot-password endpoint answers this regardless of whether the
/// email exists, so it can't be used to probe for accounts.
const RESET_CONFIRMATION: &str =
    "If an account with that email exists, a password reset link has been sent.";

// =============================================================================
// Request / Response Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Admin registration request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub admin_key: String,
}

/// Login request body. `isAdmin` asks for the admin gate on top of the
/// credential check.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Admin login request body.
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

/// Forgot-password request body.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset-password request body (the token travels in the path).
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub password: String,
}

/// Session response: token plus the public user projection.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Bare `{message}` response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// =============================================================================
// Registration & Login
// =============================================================================

/// Register a new customer account.
///
/// POST /api/auth/register
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let (user, token) = auth.register(&body.name, &body.email, &body.password).await?;

    tracing::info!(user = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.public(),
        }),
    ))
}

/// Register a verified admin account, gated by the shared admin key.
///
/// POST /api/auth/register-admin
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn register_admin(
    State(state): State<AppState>,
    Json(body): Json<AdminRegisterRequest>,
) -> Result<impl IntoResponse> {
    let Some(expected_key) = state.config().admin_registration_key.as_ref() else {
        tracing::error!("BANYAN_ADMIN_REGISTRATION_KEY is not set");
        return Err(AppError::Internal(
            "admin registration key not configured".to_string(),
        ));
    };

    if body.admin_key != expected_key.expose_secret() {
        return Err(AppError::Validation("Invalid admin key".to_string()));
    }

    let auth = AuthService::new(state.pool(), state.tokens());
    let (user, token) = auth
        .register_admin(&body.name, &body.email, &body.password)
        .await?;

    tracing::info!(user = %user.id, "Admin registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.public(),
        }),
    ))
}

/// Login with email and password.
///
/// POST /api/auth/login
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let (user, token) = auth
        .login(&body.email, &body.password, body.is_admin, TokenFlow::Login)
        .await?;

    Ok(Json(AuthResponse {
        token,
        user: user.public(),
    }))
}

/// Login for the admin dashboard; non-admin accounts are rejected.
///
/// POST /api/auth/admin-login
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(body): Json<AdminLoginRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let (user, token) = auth
        .login(&body.email, &body.password, true, TokenFlow::AdminLogin)
        .await?;

    Ok(Json(AuthResponse {
        token,
        user: user.public(),
    }))
}

// =============================================================================
// Session Introspection
// =============================================================================

/// Current user behind the bearer token.
///
/// GET /api/auth/me
pub async fn me(AuthUser(user): AuthUser) -> Json<UserDetail> {
    Json(UserDetail::from(&user))
}

/// Cheap token check for clients.
///
/// GET /api/auth/validate-token
pub async fn validate_token(AuthUser(user): AuthUser) -> impl IntoResponse {
    Json(serde_json::json!({
        "valid": true,
        "user": user.public(),
    }))
}

/// Token check returning the full user view.
///
/// GET /api/auth/verify-token
pub async fn verify_token(AuthUser(user): AuthUser) -> impl IntoResponse {
    Json(serde_json::json!({
        "valid": true,
        "user": UserDetail::from(&user),
    }))
}

/// Issue a fresh token for the current session.
///
/// POST /api/auth/refresh-token
pub async fn refresh_token(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let token = auth.refresh(&user)?;

    Ok(Json(serde_json::json!({ "token": token })))
}

// =============================================================================
// Password Reset
// =============================================================================

/// Begin a password reset.
///
/// POST /api/auth/forgot-password
///
/// Always answers with the same generic confirmation; the reset link is
/// dispatched out-of-band when the account exists and mail is configured.
#[instrument(skip(state, body))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());

    match auth.request_password_reset(&body.email).await {
        Ok(Some((user, token))) => {
            let link = reset_link(&state.config().frontend_url, &token, user.email.as_str());
            if let Some(mailer) = state.mailer() {
                // Dispatch is best-effort; the response is identical
                // whether or not the mail goes out.
                if let Err(e) = mailer
                    .send_password_reset(user.email.as_str(), &user.name, &link)
                    .await
                {
                    tracing::warn!(error = %e, "Failed to send password reset email");
                }
            } else {
                tracing::debug!(link = %link, "Mailer disabled; password reset link not sent");
            }
        }
        Ok(None) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(Json(MessageResponse {
        message: RESET_CONFIRMATION.to_string(),
    }))
}

/// Check a reset token without consuming it.
///
/// GET /api/auth/reset-password/{token}/validate
pub async fn validate_reset_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse> {
    let auth = AuthService::new(state.pool(), state.tokens());

    if auth.validate_reset_token(&token).await? {
        Ok(Json(serde_json::json!({ "valid": true })))
    } else {
        Err(AuthError::InvalidOrExpiredToken.into())
    }
}

/// Complete a password reset.
///
/// POST /api/auth/reset-password/{token}
#[instrument(skip(state, token, body))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    auth.reset_password(&token, &body.email, &body.password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password reset successful".to_string(),
    }))
}

/// Build the frontend reset link carrying the token and email.
fn reset_link(frontend_url: &str, token: &str, email: &str) -> String {
    let encoded_email: String = url::form_urlencoded::byte_serialize(email.as_bytes()).collect();
    format!(
        "{}/reset-password/{token}?email={encoded_email}",
        frontend_url.trim_end_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_link_shape() {
        let link = reset_link("http://localhost:3000", "abc123", "a+b@example.com");
        assert_eq!(
            link,
            "http://localhost:3000/reset-password/abc123?email=a%2Bb%40example.com"
        );
    }

    #[test]
    fn test_reset_link_trims_trailing_slash() {
        let link = reset_link("https://shop.example.net/", "t0k", "x@y.z");
        assert!(link.starts_with("https://shop.example.net/reset-password/t0k"));
    }

    #[test]
    fn test_login_request_defaults_is_admin() {
        let body: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.c","password":"hunter22"}"#)
                .expect("deserializes");
        assert!(!body.is_admin);
    }
}
