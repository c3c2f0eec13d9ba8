//! Shared authentication vocabulary
//!
//! The token issuer, the api service, and the client all agree on the
//! role set and the claims layout; defining them once here keeps the
//! services from drifting apart.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role assigned to a user at creation
///
/// Roles are fixed at registration; there is no role-escalation endpoint,
/// so a user keeps the role they were created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform administrator, full access
    Admin,
    /// Landlord: manages listings and responds to offers on them
    Owner,
    /// Renter: browses listings and submits offers
    Tenant,
}

impl Role {
    /// Canonical lowercase name, as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Owner => "owner",
            Role::Tenant => "tenant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            "tenant" => Ok(Role::Tenant),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Session token claims
///
/// Stateless by design: a token is valid iff its signature verifies and
/// `exp` has not passed. No server-side session table exists.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User role
    pub role: Role,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::Admin, Role::Owner, Role::Tenant] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!("landlord".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Owner).unwrap(), "\"owner\"");
        let parsed: Role = serde_json::from_str("\"tenant\"").unwrap();
        assert_eq!(parsed, Role::Tenant);
    }
}
