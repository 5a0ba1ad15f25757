//! Grantable identities.

use std::fmt;

/// Normalize an identifier for lookup. Unquoted SQL identifiers are
/// case-insensitive and stored upper case.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.to_uppercase()
}

/// A named user, a role or the `PUBLIC` pseudo-user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Principal {
    User(String),
    Role(String),
    Public,
}

impl Principal {
    /// Named user, normalized.
    pub fn user(name: &str) -> Self {
        Principal::User(normalize_identifier(name))
    }

    pub fn user_name(&self) -> Option<&str> {
        match self {
            Principal::User(name) => Some(name),
            Principal::Role(_) | Principal::Public => None,
        }
    }

    pub fn is_user(&self, name: &str) -> bool {
        matches!(self, Principal::User(n) if n == name)
    }

    pub fn role_name(&self) -> Option<&str> {
        match self {
            Principal::Role(name) => Some(name),
            Principal::User(_) | Principal::Public => None,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::User(name) | Principal::Role(name) => write!(f, "{}", name),
            Principal::Public => write!(f, "PUBLIC"),
        }
    }
}
