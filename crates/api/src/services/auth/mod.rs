//! Authentication service.
//!
//! Registration, login, and the password-reset token lifecycle. A reset
//! grant moves `absent → issued(digest, expiry)`, then either is consumed
//! (back to absent) or quietly expires; expiry is only ever checked when
//! a token is presented.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use banyan_core::{Email, Role, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::{ResetToken, User};
use crate::services::tokens::{TokenFlow, TokenService};

/// Minimum password length for customer accounts.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum password length for admin accounts.
const MIN_ADMIN_PASSWORD_LENGTH: usize = 8;

/// How long a password-reset token is honored, in hours.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Authentication service.
///
/// Handles registration, login, password changes, and the reset flow.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenService) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    // =========================================================================
    // Registration & Login
    // =========================================================================

    /// Register a new customer account.
    ///
    /// Returns the created user together with a session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingName` if the name is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }

        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = new_user(name, email, password_hash, Role::Customer, false);

        self.users.create(&user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        let token = self.tokens.issue(&user, TokenFlow::Register)?;
        Ok((user, token))
    }

    /// Register a verified admin account.
    ///
    /// The route layer is responsible for checking the shared admin key;
    /// this enforces the stricter admin password policy.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingName`, `AuthError::InvalidEmail`,
    /// `AuthError::WeakPassword`, or `AuthError::UserAlreadyExists` on
    /// the same conditions as [`AuthService::register`].
    pub async fn register_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AuthError> {
        let name = name.trim();
        if name.len() < 3 {
            return Err(AuthError::MissingName);
        }

        let email = Email::parse(email)?;
        validate_admin_password(password)?;
        let password_hash = hash_password(password)?;

        let user = new_user(name, email, password_hash, Role::Admin, true);

        self.users.create(&user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        let token = self.tokens.issue(&user, TokenFlow::AdminLogin)?;
        Ok((user, token))
    }

    /// Login with email and password.
    ///
    /// `expect_admin` enforces the admin role on top of the credential
    /// check (used by the admin entry points). `flow` selects the token
    /// lifetime for the issuing endpoint.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or
    /// the password doesn't match.
    /// Returns `AuthError::AdminOnly` if `expect_admin` and the account
    /// isn't an admin.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        expect_admin: bool,
        flow: TokenFlow,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if expect_admin && !user.role.is_admin() {
            return Err(AuthError::AdminOnly);
        }

        verify_password(password, &user.password_hash)?;

        let token = self.tokens.issue(&user, flow)?;
        Ok((user, token))
    }

    /// Issue a fresh token for an already-authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails.
    pub fn refresh(&self, user: &User) -> Result<String, AuthError> {
        Ok(self.tokens.issue(user, TokenFlow::Refresh)?)
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Begin a password reset for `email`.
    ///
    /// Returns `None` when the email is unknown - callers answer with the
    /// same generic confirmation either way, so the endpoint can't be
    /// used to probe which emails exist. On success the cleartext token
    /// (for the mail) and the updated user are returned; only the digest
    /// is stored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, AuthError> {
        let email = Email::parse(email)?;

        let Some(mut user) = self.users.get_by_email(&email).await? else {
            return Ok(None);
        };

        let token = generate_reset_token();
        user.reset_token = Some(ResetToken {
            digest: reset_token_digest(&token),
            expires_at: Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS),
        });
        self.users.save(&user).await?;

        Ok(Some((user, token)))
    }

    /// Whether `token` currently grants a reset to some account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn validate_reset_token(&self, token: &str) -> Result<bool, AuthError> {
        let user = self
            .users
            .get_by_reset_digest(&reset_token_digest(token))
            .await?;

        Ok(user.is_some_and(|u| {
            u.reset_token
                .as_ref()
                .is_some_and(|t| !t.is_expired(Utc::now()))
        }))
    }

    /// Complete a password reset.
    ///
    /// The token digest, its expiry, and the claimed email must all line
    /// up with a single account. On success the password is replaced and
    /// both reset fields are cleared in the same write.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidOrExpiredToken` when no account matches.
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    pub async fn reset_password(
        &self,
        token: &str,
        email: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;
        let email = Email::parse(email).map_err(|_| AuthError::InvalidOrExpiredToken)?;

        let mut user = self
            .users
            .get_by_reset_digest(&reset_token_digest(token))
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        // Lazy expiry check; nothing sweeps lapsed grants.
        let expired = user
            .reset_token
            .as_ref()
            .is_none_or(|t| t.is_expired(Utc::now()));
        if expired || user.email != email {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        user.password_hash = hash_password(new_password)?;
        user.reset_token = None;
        self.users.save(&user).await?;

        Ok(())
    }

    /// Change the password of a logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the current password is wrong.
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    pub async fn change_password(
        &self,
        user: &mut User,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        verify_password(current_password, &user.password_hash)?;
        validate_password(new_password)?;

        user.password_hash = hash_password(new_password)?;
        self.users.save(user).await?;

        Ok(())
    }

    // =========================================================================
    // Session Resolution
    // =========================================================================

    /// Resolve a bearer token to its live user record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` for malformed or expired tokens.
    /// Returns `AuthError::UserNotFound` when the account behind a valid
    /// token has since been deleted.
    pub async fn verify_session(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(token)?;
        self.users
            .get_by_id(claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Build a fresh user record.
fn new_user(
    name: &str,
    email: Email,
    password_hash: String,
    role: Role,
    is_verified: bool,
) -> User {
    let now = Utc::now();
    User {
        id: UserId::generate(),
        name: name.to_owned(),
        email,
        password_hash,
        role,
        is_verified,
        phone: None,
        address: None,
        wishlist: Vec::new(),
        reset_token: None,
        created_at: now,
        updated_at: now,
    }
}

/// Validate a customer password.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate an admin password: longer, and mixed character classes.
fn validate_admin_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_ADMIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_ADMIN_PASSWORD_LENGTH} characters"
        )));
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_ascii_alphanumeric());

    if !(has_lower && has_upper && has_digit && has_symbol) {
        return Err(AuthError::WeakPassword(
            "password must contain an uppercase letter, a lowercase letter, \
             a number, and a special character"
                .to_string(),
        ));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate a high-entropy reset token (hex, 32 random bytes).
fn generate_reset_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// The stored digest of a reset token.
fn reset_token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_minimum() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longer").is_ok());
    }

    #[test]
    fn test_validate_admin_password_requires_classes() {
        assert!(validate_admin_password("Aa1!aaaa").is_ok());
        assert!(validate_admin_password("alllowercase1!").is_err());
        assert!(validate_admin_password("ALLUPPERCASE1!").is_err());
        assert!(validate_admin_password("NoDigits!!").is_err());
        assert!(validate_admin_password("NoSymbols11").is_err());
        assert!(validate_admin_password("Aa1!").is_err());
    }

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same input").unwrap();
        let b = hash_password("same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_reset_token_shape_and_digest() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        // Digest is deterministic and never equals the token itself.
        assert_eq!(reset_token_digest(&token), reset_token_digest(&token));
        assert_ne!(reset_token_digest(&token), token);
    }

    #[test]
    fn test_reset_tokens_are_unique() {
        assert_ne!(generate_reset_token(), generate_reset_token());
    }

    #[test]
    fn test_new_user_defaults() {
        let user = new_user(
            "Meera",
            Email::parse("meera@example.com").unwrap(),
            "hash".to_string(),
            Role::Customer,
            false,
        );
        assert_eq!(user.role, Role::Customer);
        assert!(!user.is_verified);
        assert!(user.wishlist.is_empty());
        assert!(user.reset_token.is_none());
    }
}
