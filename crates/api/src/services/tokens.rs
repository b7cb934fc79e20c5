//! Session token issuing and verification.
//!
//! Bearer tokens are HS256 JWTs carrying the user id, role, and email.
//! Each issuing flow has its own lifetime (see [`TokenTtlConfig`]); the
//! windows are config, not code, because the deployed clients were built
//! against different values per entry point.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use banyan_core::{Role, UserId};

use crate::config::TokenTtlConfig;
use crate::models::user::User;

/// Errors that can occur when issuing or checking tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token creation failed.
    #[error("token creation failed: {0}")]
    Creation(String),
    /// Token is malformed, tampered with, or expired.
    #[error("token validation failed: {0}")]
    Validation(String),
}

/// The entry point a session token is issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFlow {
    /// `POST /api/auth/register` and `register-admin`
    Register,
    /// `POST /api/auth/login`
    Login,
    /// `POST /api/auth/admin-login`
    AdminLogin,
    /// `POST /api/auth/refresh-token`
    Refresh,
}

/// Claims carried in a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: UserId,
    /// Role at issue time; the middleware re-reads the live role anyway.
    pub role: Role,
    /// Email at issue time.
    pub email: String,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
}

/// Issues and verifies session tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TokenTtlConfig,
}

impl TokenService {
    /// Create a token service from the signing secret and lifetime table.
    #[must_use]
    pub fn new(secret: &SecretString, ttl: TokenTtlConfig) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl,
        }
    }

    /// Issue a session token for `user` with the lifetime of `flow`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Creation` if signing fails.
    pub fn issue(&self, user: &User, flow: TokenFlow) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            role: user.role,
            email: user.email.as_str().to_owned(),
            iat: now.timestamp(),
            exp: (now + self.ttl_for(flow)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Creation(e.to_string()))
    }

    /// Verify a token's signature and expiry and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Validation` for malformed, tampered, or
    /// expired tokens.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| TokenError::Validation(e.to_string()))
    }

    /// The configured lifetime for an issuing flow.
    #[must_use]
    pub const fn ttl_for(&self, flow: TokenFlow) -> Duration {
        match flow {
            TokenFlow::Register => self.ttl.register,
            TokenFlow::Login | TokenFlow::Refresh => self.ttl.login,
            TokenFlow::AdminLogin => self.ttl.admin_login,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use banyan_core::Email;

    fn test_ttl() -> TokenTtlConfig {
        TokenTtlConfig {
            register: Duration::hours(168),
            login: Duration::hours(24),
            admin_login: Duration::hours(24),
        }
    }

    fn test_service() -> TokenService {
        TokenService::new(
            &SecretString::from("kJ8#mN2$pQ5^rT9&vX3*zB6@cF0!hL4%"),
            test_ttl(),
        )
    }

    fn test_user(role: Role) -> User {
        let now = Utc::now();
        User {
            id: UserId::generate(),
            name: "Ravi".to_string(),
            email: Email::parse("ravi@example.com").unwrap(),
            password_hash: String::new(),
            role,
            is_verified: true,
            phone: None,
            address: None,
            wishlist: Vec::new(),
            reset_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let service = test_service();
        let user = test_user(Role::Admin);

        let token = service.issue(&user, TokenFlow::Login).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.email, "ravi@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let user = test_user(Role::Customer);
        let token = test_service().issue(&user, TokenFlow::Login).unwrap();

        let other = TokenService::new(
            &SecretString::from("wG7!dS1@jK4#nM8$qP2^tV5&yZ9*bE3%"),
            test_ttl(),
        );
        assert!(matches!(
            other.verify(&token),
            Err(TokenError::Validation(_))
        ));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let service = test_service();
        assert!(service.verify("not.a.token").is_err());
        assert!(service.verify("").is_err());
    }

    #[test]
    fn test_verify_rejects_expired() {
        let service = test_service();
        let user = test_user(Role::Customer);

        // Hand-roll claims already past expiry (beyond the default leeway).
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            role: user.role,
            email: user.email.as_str().to_owned(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &service.encoding).unwrap();

        assert!(matches!(
            service.verify(&token),
            Err(TokenError::Validation(_))
        ));
    }

    #[test]
    fn test_ttl_table_per_flow() {
        let service = test_service();
        assert_eq!(service.ttl_for(TokenFlow::Register), Duration::hours(168));
        assert_eq!(service.ttl_for(TokenFlow::Login), Duration::hours(24));
        assert_eq!(service.ttl_for(TokenFlow::Refresh), Duration::hours(24));
        assert_eq!(service.ttl_for(TokenFlow::AdminLogin), Duration::hours(24));
    }
}
