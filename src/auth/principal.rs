//! Declared roles and the authenticated principal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use utoipa::ToSchema;

/// The static set of roles the application declares. Routing configuration
/// builds its role requirements from this enumeration; there is no runtime
/// role registration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub const ALL: [Self; 2] = [Self::Admin, Self::User];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }

    /// Parse a stored role name; unknown names yield `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "ADMIN" => Some(Self::Admin),
            "USER" => Some(Self::User),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All valid role names as an immutable snapshot.
#[must_use]
pub fn all_roles() -> BTreeSet<&'static str> {
    Role::ALL.iter().map(|role| role.as_str()).collect()
}

/// Authenticated identity: a username and every role granted to it.
///
/// Built once at authentication time from the aggregated role rows and held
/// by the session for its lifetime; authorization checks never re-query the
/// store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    username: String,
    roles: BTreeSet<Role>,
}

impl Principal {
    #[must_use]
    pub fn new(username: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            username: username.into(),
            roles: roles.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("OPERATOR"), None);
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn all_roles_is_complete() {
        let roles = all_roles();
        assert_eq!(roles.len(), Role::ALL.len());
        assert!(roles.contains("ADMIN"));
        assert!(roles.contains("USER"));
    }

    #[test]
    fn principal_aggregates_roles() {
        let principal = Principal::new("alice", [Role::User, Role::Admin, Role::User]);
        assert_eq!(principal.username(), "alice");
        assert_eq!(principal.roles().len(), 2);
        assert!(principal.has_role(Role::Admin));
        assert!(principal.has_role(Role::User));
    }

    #[test]
    fn principal_without_role_is_denied_membership() {
        let principal = Principal::new("bob", [Role::User]);
        assert!(!principal.has_role(Role::Admin));
    }
}
