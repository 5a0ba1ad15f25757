//! Literal values carried by DML statements.

use std::cmp::Ordering;
use std::fmt;

/// A SQL value. Only the types needed for keys and check constraints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Varchar(String),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// SQL comparison: `None` when either side is NULL or the types differ.
    pub fn sql_cmp(&self, other: &SqlValue) -> Option<Ordering> {
        match (self, other) {
            (SqlValue::Integer(a), SqlValue::Integer(b)) => Some(a.cmp(b)),
            (SqlValue::Varchar(a), SqlValue::Varchar(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Integer(i) => write!(f, "{}", i),
            SqlValue::Varchar(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Varchar(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_never_compares() {
        assert_eq!(SqlValue::Null.sql_cmp(&SqlValue::Integer(1)), None);
        assert_eq!(SqlValue::Integer(1).sql_cmp(&SqlValue::Null), None);
        assert_eq!(SqlValue::Integer(1).sql_cmp(&SqlValue::Integer(2)), Some(Ordering::Less));
    }
}
