//! Contact form route handler.
//!
//! Forwards submissions to the support inbox and sends the customer a
//! confirmation, both over SMTP.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Contact form data. Everything is required; the check happens here so
/// a missing field answers 400 with a message instead of a bare
/// deserialization error.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// Submit the contact form.
///
/// POST /api/contact
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> Result<impl IntoResponse> {
    let (name, email, subject, message) = match (
        non_empty(form.name),
        non_empty(form.email),
        non_empty(form.subject),
        non_empty(form.message),
    ) {
        (Some(n), Some(e), Some(s), Some(m)) => (n, e, s, m),
        _ => {
            return Err(AppError::Validation("All fields are required".to_string()));
        }
    };

    let email = email.to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::Validation(
            "Please enter a valid email address.".to_string(),
        ));
    }

    let Some(mailer) = state.mailer() else {
        tracing::error!("Contact form submitted but SMTP is not configured");
        return Err(AppError::Internal("email service not available".to_string()));
    };

    mailer
        .send_contact_notification(&name, &email, &subject, &message)
        .await?;
    mailer
        .send_contact_confirmation(&email, &name, &subject)
        .await?;

    tracing::info!(email = %email, subject = %subject, "Contact form processed");

    Ok(Json(serde_json::json!({
        "message": "Message sent successfully"
    })))
}

/// Trimmed, non-empty field value.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    let mut parts = email.splitn(2, '@');
    let Some(local) = parts.next() else {
        return false;
    };
    let Some(domain) = parts.next() else {
        return false;
    };
    !local.is_empty() && !domain.is_empty() && domain.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("no-at"));
    }

    #[test]
    fn test_non_empty_trims() {
        assert_eq!(non_empty(Some("  hi  ".to_string())), Some("hi".to_string()));
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }
}
