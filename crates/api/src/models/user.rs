//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use banyan_core::{Email, ProductId, Role, UserId};

/// Postal address attached to a user profile.
///
/// Stored as a JSONB document; every field is optional because profiles
/// are filled in incrementally from the account page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

/// An outstanding password-reset grant.
///
/// Only the SHA-256 digest of the emailed token is kept; the pair of
/// fields is set and cleared together, so a lone digest or a lone expiry
/// never exists in a well-formed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    /// Hex-encoded SHA-256 digest of the token that was emailed out.
    pub digest: String,
    /// Instant after which the token stops being honored.
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    /// Whether the grant has lapsed at the given instant.
    ///
    /// Expired grants are never swept; they are simply ignored here when
    /// a reset is attempted.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// A registered account (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email, unique across accounts.
    pub email: Email,
    /// Argon2id password hash.
    pub password_hash: String,
    /// Account role.
    pub role: Role,
    /// Whether the account has been verified.
    pub is_verified: bool,
    /// Optional contact phone number.
    pub phone: Option<String>,
    /// Optional postal address.
    pub address: Option<Address>,
    /// Wishlisted products, in insertion order. Membership is unique;
    /// writes go through [`User::wishlist_add`].
    pub wishlist: Vec<ProductId>,
    /// Outstanding password-reset grant, if any.
    pub reset_token: Option<ResetToken>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Add a product to the wishlist.
    ///
    /// Returns `false` (leaving the list untouched) when the product is
    /// already present.
    pub fn wishlist_add(&mut self, product: ProductId) -> bool {
        if self.wishlist.contains(&product) {
            return false;
        }
        self.wishlist.push(product);
        true
    }

    /// Remove a product from the wishlist.
    ///
    /// Removing an absent product is a no-op.
    pub fn wishlist_remove(&mut self, product: ProductId) {
        self.wishlist.retain(|p| *p != product);
    }

    /// The client-safe projection of this account.
    #[must_use]
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Subset of account fields safe to return to a client.
///
/// Excludes the password hash and the reset-token fields.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
}

/// The full client-safe view of an account (everything but credentials
/// and reset fields). Used by `/me`, token verification, and the admin
/// user endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    pub wishlist: Vec<ProductId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserDetail {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_verified: user.is_verified,
            phone: user.phone.clone(),
            address: user.address.clone(),
            wishlist: user.wishlist.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: UserId::generate(),
            name: "Asha".to_string(),
            email: Email::parse("asha@example.com").unwrap(),
            password_hash: "$argon2id$stub".to_string(),
            role: Role::Customer,
            is_verified: false,
            phone: None,
            address: None,
            wishlist: Vec::new(),
            reset_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_wishlist_membership_is_unique() {
        let mut user = sample_user();
        let product = ProductId::generate();

        assert!(user.wishlist_add(product));
        assert!(!user.wishlist_add(product));
        assert_eq!(user.wishlist.len(), 1);

        user.wishlist_remove(product);
        assert!(user.wishlist.is_empty());
        // Removing again is harmless.
        user.wishlist_remove(product);
    }

    #[test]
    fn test_wishlist_preserves_insertion_order() {
        let mut user = sample_user();
        let first = ProductId::generate();
        let second = ProductId::generate();
        user.wishlist_add(first);
        user.wishlist_add(second);
        assert_eq!(user.wishlist, vec![first, second]);
    }

    #[test]
    fn test_reset_token_expiry() {
        let now = Utc::now();
        let token = ResetToken {
            digest: "ab".repeat(32),
            expires_at: now + Duration::hours(1),
        };
        assert!(!token.is_expired(now));
        assert!(token.is_expired(now + Duration::hours(2)));
    }

    #[test]
    fn test_public_projection_has_no_secrets() {
        let user = sample_user();
        let json = serde_json::to_value(user.public()).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 4);
        for key in ["id", "name", "email", "role"] {
            assert!(object.contains_key(key), "missing {key}");
        }
        for key in ["password_hash", "passwordHash", "reset_token", "wishlist"] {
            assert!(!object.contains_key(key), "leaked {key}");
        }
    }
}
