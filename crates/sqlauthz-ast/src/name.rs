//! Object names as written in statements.

use std::fmt;

/// A possibly schema-qualified object name (`schema.name` or `name`).
///
/// Unqualified names resolve against the session's current schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectName {
    pub schema: Option<String>,
    pub name: String,
}

impl ObjectName {
    /// Unqualified name.
    pub fn new(name: impl Into<String>) -> Self {
        ObjectName { schema: None, name: name.into() }
    }

    /// Schema-qualified name.
    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        ObjectName { schema: Some(schema.into()), name: name.into() }
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl From<&str> for ObjectName {
    /// Splits on the first `.`; `"s1.t1"` becomes a qualified name.
    fn from(value: &str) -> Self {
        match value.split_once('.') {
            Some((schema, name)) => ObjectName::qualified(schema, name),
            None => ObjectName::new(value),
        }
    }
}
