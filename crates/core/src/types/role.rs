//! User roles.

use serde::{Deserialize, Serialize};

/// Account role gating access to the admin surface.
///
/// Every user carries exactly one role. New registrations default to
/// [`Role::Customer`]; admin accounts are created through the keyed
/// admin-registration flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular shopper: own profile, wishlist, orders, ratings.
    #[default]
    Customer,
    /// Full access to catalog management, all orders, and user administration.
    Admin,
}

impl Role {
    /// Whether this role grants admin access.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_round_trip() {
        for role in [Role::Customer, Role::Admin] {
            assert_eq!(Role::from_str(&role.to_string()), Ok(role));
        }
    }

    #[test]
    fn test_rejects_unknown() {
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn test_default_is_customer() {
        assert_eq!(Role::default(), Role::Customer);
        assert!(!Role::Customer.is_admin());
        assert!(Role::Admin.is_admin());
    }
}
