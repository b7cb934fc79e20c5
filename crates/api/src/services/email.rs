//! Email service for contact-form mail and password-reset links.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// HTML template for the contact-form notification sent to support.
#[derive(Template)]
#[template(path = "email/contact_admin.html")]
struct ContactAdminHtml<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message_lines: Vec<&'a str>,
}

/// Plain text template for the contact-form notification.
#[derive(Template)]
#[template(path = "email/contact_admin.txt")]
struct ContactAdminText<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message: &'a str,
}

/// HTML template for the confirmation sent back to the customer.
#[derive(Template)]
#[template(path = "email/contact_confirmation.html")]
struct ContactConfirmationHtml<'a> {
    name: &'a str,
    subject: &'a str,
}

/// Plain text template for the confirmation.
#[derive(Template)]
#[template(path = "email/contact_confirmation.txt")]
struct ContactConfirmationText<'a> {
    name: &'a str,
    subject: &'a str,
}

/// HTML template for the password-reset email.
#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    name: &'a str,
    reset_url: &'a str,
}

/// Plain text template for the password-reset email.
#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    name: &'a str,
    reset_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    contact_inbox: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay parameters are invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            contact_inbox: config.contact_inbox.clone(),
        })
    }

    /// Forward a contact-form submission to the support inbox.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_contact_notification(
        &self,
        name: &str,
        email: &str,
        subject: &str,
        message: &str,
    ) -> Result<(), EmailError> {
        let html = ContactAdminHtml {
            name,
            email,
            subject,
            message_lines: message.lines().collect(),
        }
        .render()?;
        let text = ContactAdminText {
            name,
            email,
            subject,
            message,
        }
        .render()?;

        let to = self.contact_inbox.clone();
        self.send_multipart_email(&to, &format!("New Contact Form: {subject}"), &text, &html)
            .await
    }

    /// Send the "we received your message" confirmation to the customer.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_contact_confirmation(
        &self,
        to: &str,
        name: &str,
        subject: &str,
    ) -> Result<(), EmailError> {
        let html = ContactConfirmationHtml { name, subject }.render()?;
        let text = ContactConfirmationText { name, subject }.render()?;

        self.send_multipart_email(to, "Thank you for contacting us", &text, &html)
            .await
    }

    /// Send a password-reset link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        reset_url: &str,
    ) -> Result<(), EmailError> {
        let html = PasswordResetHtml { name, reset_url }.render()?;
        let text = PasswordResetText { name, reset_url }.render()?;

        self.send_multipart_email(to, "Reset your Banyan Bazaar password", &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_admin_html_escapes_and_splits_lines() {
        let html = ContactAdminHtml {
            name: "Asha <script>",
            email: "asha@example.com",
            subject: "Damaged order",
            message_lines: "line one\nline two".lines().collect(),
        }
        .render()
        .unwrap();

        assert!(html.contains("line one"));
        assert!(html.contains("line two"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_password_reset_templates_carry_url() {
        let url = "http://localhost:3000/reset-password/abc123?email=a%40b.c";
        let html = PasswordResetHtml {
            name: "Asha",
            reset_url: url,
        }
        .render()
        .unwrap();
        let text = PasswordResetText {
            name: "Asha",
            reset_url: url,
        }
        .render()
        .unwrap();

        assert!(html.contains("abc123"));
        assert!(text.contains(url));
    }

    #[test]
    fn test_confirmation_mentions_subject() {
        let text = ContactConfirmationText {
            name: "Ravi",
            subject: "Wholesale inquiry",
        }
        .render()
        .unwrap();
        assert!(text.contains("Wholesale inquiry"));
    }
}
