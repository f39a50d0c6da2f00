//! Marketplace roles.

use serde::{Deserialize, Serialize};

/// Error returned when parsing a [`Role`] from a string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid role: {0}. Valid roles: buyer, seller, admin")]
pub struct RoleParseError(String);

/// Role attached to a marketplace account.
///
/// The role decides which views and operations a user may reach. `Admin` is
/// a superset capability for gating purposes: an admin passes any role
/// requirement. There is no seller/buyer hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can browse the catalog and manage a cart and orders.
    Buyer,
    /// Can additionally manage shops and product listings.
    Seller,
    /// Full access; passes every role requirement.
    Admin,
}

impl Role {
    /// The wire representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Self::Buyer),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            other => Err(RoleParseError(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Seller).unwrap(), "\"seller\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("buyer".parse::<Role>().unwrap(), Role::Buyer);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_display_matches_wire_format() {
        for role in [Role::Buyer, Role::Seller, Role::Admin] {
            assert_eq!(role.to_string(), role.as_str());
        }
    }
}
