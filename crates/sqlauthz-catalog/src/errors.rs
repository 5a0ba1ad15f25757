use thiserror::Error;

/// Errors returned by catalog operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("Schema '{0}' already exists")]
    SchemaAlreadyExists(String),
    #[error("Schema '{0}' does not exist")]
    SchemaNotFound(String),
    #[error("Schema '{0}' is not empty")]
    SchemaNotEmpty(String),
    #[error("'{operation}' is not allowed in the system schema '{schema}'")]
    SystemSchema { operation: String, schema: String },
    #[error("{kind} '{name}' already exists in schema '{schema}'")]
    ObjectAlreadyExists { kind: &'static str, name: String, schema: String },
    #[error("Table/View '{0}' does not exist")]
    TableNotFound(String),
    #[error("Column '{column_name}' is not in table '{table_name}'")]
    ColumnNotFound { column_name: String, table_name: String },
    #[error("Column '{column_name}' appears more than once in '{table_name}'")]
    DuplicateColumn { column_name: String, table_name: String },
    #[error("{kind} '{name}' does not exist")]
    RoutineNotFound { kind: &'static str, name: String },
    #[error("{kind} '{name}' does not exist")]
    ObjectNotFound { kind: &'static str, name: String },
    #[error("Table '{0}' already has a primary key")]
    DuplicatePrimaryKey(String),
    #[error(
        "Constraint '{constraint}' is invalid: no unique or primary key on '{parent}' matches \
         the foreign key columns"
    )]
    InvalidForeignKey { constraint: String, parent: String },
    #[error(
        "Operation '{operation}' cannot be performed on object '{object}' because {dependent_kind} \
         '{dependent}' is dependent on that object"
    )]
    ObjectInUse {
        operation: String,
        object: String,
        dependent_kind: &'static str,
        dependent: String,
    },
    #[error("Role '{0}' already exists")]
    RoleAlreadyExists(String),
    #[error("Invalid role '{0}'")]
    RoleNotFound(String),
    #[error("'{0}' is reserved and cannot be used as a role name")]
    ReservedRoleName(String),
    #[error("Role names starting with 'SYS' are reserved: '{0}'")]
    SystemRoleName(String),
    #[error("Granting role '{role}' to '{grantee}' would create a circular role grant")]
    CircularRoleGrant { role: String, grantee: String },
}

impl CatalogError {
    pub fn sql_state(&self) -> &'static str {
        match self {
            CatalogError::SchemaAlreadyExists(_) => "X0Y68",
            CatalogError::SchemaNotFound(_) => "42Y07",
            CatalogError::SchemaNotEmpty(_) => "X0Y54",
            CatalogError::SystemSchema { .. } => "42X62",
            CatalogError::ObjectAlreadyExists { .. } => "X0Y32",
            CatalogError::TableNotFound(_) => "42X05",
            CatalogError::ColumnNotFound { .. } => "42X14",
            CatalogError::DuplicateColumn { .. } => "42X12",
            CatalogError::RoutineNotFound { .. } => "42Y03",
            CatalogError::ObjectNotFound { .. } => "42X94",
            CatalogError::DuplicatePrimaryKey(_) => "42X90",
            CatalogError::InvalidForeignKey { .. } => "X0Y44",
            CatalogError::ObjectInUse { .. } => "X0Y23",
            CatalogError::RoleAlreadyExists(_) => "X0Y68",
            CatalogError::RoleNotFound(_) => "0P000",
            CatalogError::ReservedRoleName(_) => "4251B",
            CatalogError::SystemRoleName(_) => "4293A",
            CatalogError::CircularRoleGrant { .. } => "4251C",
        }
    }
}
