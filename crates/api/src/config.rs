//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BANYAN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `BANYAN_JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `BANYAN_HOST` - Bind address (default: 127.0.0.1)
//! - `BANYAN_PORT` - Listen port (default: 5000)
//! - `BANYAN_FRONTEND_URL` - Base URL used in password-reset links (default: <http://localhost:3000>)
//! - `BANYAN_REGISTER_TOKEN_TTL_HOURS` - Session token lifetime issued at registration (default: 168)
//! - `BANYAN_LOGIN_TOKEN_TTL_HOURS` - Session token lifetime issued at login (default: 24)
//! - `BANYAN_ADMIN_TOKEN_TTL_HOURS` - Session token lifetime issued at admin login (default: 24)
//! - `BANYAN_ADMIN_REGISTRATION_KEY` - Shared key gating the admin-registration endpoint
//! - `BANYAN_UPLOADS_DIR` - Directory for locally stored uploads (default: uploads)
//! - `BANYAN_ASSET_HOST_URL` - Remote asset host endpoint; local storage only when unset
//! - `BANYAN_ASSET_HOST_API_KEY` - Remote asset host credential (required with the URL)
//! - `BANYAN_SMTP_HOST` / `BANYAN_SMTP_PORT` / `BANYAN_SMTP_USERNAME` / `BANYAN_SMTP_PASSWORD`
//!   - SMTP relay; mail endpoints degrade gracefully when unset
//! - `BANYAN_EMAIL_FROM` - From header for outbound mail
//! - `BANYAN_CONTACT_INBOX` - Destination for contact-form submissions
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Sentry error tracking

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Banyan API configuration.
#[derive(Debug, Clone)]
pub struct BanyanConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Base URL of the customer-facing frontend, used in password-reset links
    pub frontend_url: String,
    /// Token signing secret
    pub jwt_secret: SecretString,
    /// Per-flow session token lifetimes
    pub token_ttl: TokenTtlConfig,
    /// Shared key required by the admin-registration endpoint (disabled when unset)
    pub admin_registration_key: Option<SecretString>,
    /// Local upload storage
    pub uploads: UploadsConfig,
    /// Remote asset host (optional - local fallback is always available)
    pub asset_host: Option<AssetHostConfig>,
    /// SMTP relay (optional - mail endpoints degrade when unset)
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Session token lifetime per issuing flow.
///
/// The windows are deliberately not unified: the source deployment issued
/// week-long tokens at registration and day-long tokens at login, and
/// clients depend on that. Each window is its own knob instead of a
/// guessed single value.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtlConfig {
    /// Lifetime of tokens issued by `POST /api/auth/register`
    pub register: Duration,
    /// Lifetime of tokens issued by `POST /api/auth/login` and refresh
    pub login: Duration,
    /// Lifetime of tokens issued by `POST /api/auth/admin-login` and admin registration
    pub admin_login: Duration,
}

/// Local upload storage configuration.
#[derive(Debug, Clone)]
pub struct UploadsConfig {
    /// Directory files land in when the remote asset host is unavailable
    pub dir: PathBuf,
    /// Public URL prefix the directory is served under
    pub public_path: String,
}

/// Remote asset host configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct AssetHostConfig {
    /// Upload endpoint base URL
    pub base_url: String,
    /// Bearer credential for the asset host API
    pub api_key: SecretString,
}

impl std::fmt::Debug for AssetHostConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetHostConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// SMTP relay configuration for outbound mail.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
    /// Inbox that receives contact-form submissions
    pub contact_inbox: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("contact_inbox", &self.contact_inbox)
            .finish()
    }
}

impl BanyanConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BANYAN_DATABASE_URL")?;
        let host = get_env_or_default("BANYAN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BANYAN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("BANYAN_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BANYAN_PORT".to_string(), e.to_string()))?;
        let frontend_url = get_env_or_default("BANYAN_FRONTEND_URL", "http://localhost:3000");

        let jwt_secret = get_validated_secret("BANYAN_JWT_SECRET")?;
        validate_jwt_secret(&jwt_secret, "BANYAN_JWT_SECRET")?;

        let token_ttl = TokenTtlConfig::from_env()?;
        let admin_registration_key =
            get_optional_env("BANYAN_ADMIN_REGISTRATION_KEY").map(SecretString::from);

        let uploads = UploadsConfig {
            dir: PathBuf::from(get_env_or_default("BANYAN_UPLOADS_DIR", "uploads")),
            public_path: "/uploads".to_string(),
        };

        let asset_host = AssetHostConfig::from_env()?;
        let email = EmailConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_env_or_default("SENTRY_SAMPLE_RATE", "1.0")
            .parse::<f32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SENTRY_SAMPLE_RATE".to_string(), e.to_string())
            })?;
        let sentry_traces_sample_rate = get_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")
            .parse::<f32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SENTRY_TRACES_SAMPLE_RATE".to_string(), e.to_string())
            })?;

        Ok(Self {
            database_url,
            host,
            port,
            frontend_url,
            jwt_secret,
            token_ttl,
            admin_registration_key,
            uploads,
            asset_host,
            email,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl TokenTtlConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            register: get_ttl_hours("BANYAN_REGISTER_TOKEN_TTL_HOURS", 168)?,
            login: get_ttl_hours("BANYAN_LOGIN_TOKEN_TTL_HOURS", 24)?,
            admin_login: get_ttl_hours("BANYAN_ADMIN_TOKEN_TTL_HOURS", 24)?,
        })
    }
}

impl AssetHostConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(base_url) = get_optional_env("BANYAN_ASSET_HOST_URL") else {
            return Ok(None);
        };

        // Fail loudly on a malformed URL instead of at the first upload.
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("BANYAN_ASSET_HOST_URL".to_string(), e.to_string())
        })?;

        let api_key = get_validated_secret("BANYAN_ASSET_HOST_API_KEY")?;

        Ok(Some(Self { base_url, api_key }))
    }
}

impl EmailConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        // Mail is configured only when the full credential set is present.
        let Some(smtp_host) = get_optional_env("BANYAN_SMTP_HOST") else {
            return Ok(None);
        };
        let smtp_username = get_required_env("BANYAN_SMTP_USERNAME")?;
        let smtp_password = get_required_secret("BANYAN_SMTP_PASSWORD")?;
        let smtp_port = get_env_or_default("BANYAN_SMTP_PORT", "587")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BANYAN_SMTP_PORT".to_string(), e.to_string())
            })?;
        let from_address = get_env_or_default("BANYAN_EMAIL_FROM", &smtp_username);
        let contact_inbox =
            get_env_or_default("BANYAN_CONTACT_INBOX", "support@banyanbazaar.in");

        Ok(Some(Self {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            from_address,
            contact_inbox,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a token lifetime given in whole hours.
fn get_ttl_hours(key: &str, default_hours: i64) -> Result<Duration, ConfigError> {
    let hours = get_env_or_default(key, &default_hours.to_string())
        .parse::<i64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if hours <= 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("lifetime must be positive (got {hours})"),
        ));
    }
    Ok(Duration::hours(hours))
}

/// Validate that the token signing secret meets minimum length requirements.
fn validate_jwt_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_jwt_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_jwt_secret(&secret, "TEST_JWT");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_jwt_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        let result = validate_jwt_secret(&secret, "TEST_JWT");
        assert!(result.is_ok());
    }

    #[test]
    fn test_ttl_rejects_non_positive() {
        // Exercised through the parser used by from_env; the env var is
        // unset here, so the default path is what's under test.
        let ttl = get_ttl_hours("BANYAN_TEST_UNSET_TTL", 24).unwrap();
        assert_eq!(ttl, Duration::hours(24));
    }

    #[test]
    fn test_email_config_debug_redacts_password() {
        let config = EmailConfig {
            smtp_host: "smtp.example.net".to_string(),
            smtp_port: 587,
            smtp_username: "mailer".to_string(),
            smtp_password: SecretString::from("super_secret_smtp_password"),
            from_address: "noreply@banyanbazaar.in".to_string(),
            contact_inbox: "support@banyanbazaar.in".to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("smtp.example.net"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_smtp_password"));
    }

    #[test]
    fn test_asset_host_debug_redacts_key() {
        let config = AssetHostConfig {
            base_url: "https://assets.example.net/v1".to_string(),
            api_key: SecretString::from("asset-host-key-value"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("https://assets.example.net/v1"));
        assert!(!debug_output.contains("asset-host-key-value"));
    }
}
