use sqlauthz_catalog::{CatalogError, PrivilegeKind};
use sqlauthz_storage::StorageError;
use thiserror::Error;

/// Authorization failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    /// `missing_columns` is `Some` for column-scoped requests: the requested
    /// columns the principal holds no privilege on.
    #[error("User '{principal}' does not have {privilege} permission on {}'{object}'", describe_columns(.missing_columns))]
    NoPrivilege {
        principal: String,
        privilege: PrivilegeKind,
        object: String,
        missing_columns: Option<Vec<String>>,
    },
    #[error("User '{grantor}' may not grant or revoke {privilege} on '{object}'")]
    GrantorNotOwner { grantor: String, privilege: PrivilegeKind, object: String },
    #[error("User '{principal}' may not grant or revoke privileges to or from themselves")]
    SelfGrantRevoke { principal: String },
    #[error("Privileges of '{principal}' on '{object}' cannot be granted or revoked: they own it")]
    OwnerPrivilegeImmutable { principal: String, object: String },
    #[error("Grant and revoke are not allowed on system object '{object}'")]
    SystemObjectProtected { object: String },
    #[error("User '{principal}' can not perform the operation in schema '{schema}'")]
    SchemaNotOwned { principal: String, schema: String },
    #[error(
        "Operation '{operation}' cannot be performed on object '{object}' because {dependent_kind} \
         '{dependent}' is dependent on that object"
    )]
    DependentsExist {
        operation: String,
        object: String,
        dependent_kind: &'static str,
        dependent: String,
    },
    #[error("GRANT and REVOKE are not supported on {kind} '{object}'")]
    UnsupportedGrantTarget { kind: &'static str, object: String },
    #[error("Only the database owner can perform '{operation}'")]
    RoleAdministration { operation: &'static str },
    #[error("Role '{role}' is not granted to '{user}'")]
    RoleNotGranted { role: String, user: String },
    #[error("'PUBLIC' is reserved and cannot be used as a role name")]
    PublicRole,
}

fn describe_columns(columns: &Option<Vec<String>>) -> String {
    match columns {
        Some(columns) => format!("column(s) {} of ", columns.join(", ")),
        None => String::new(),
    }
}

impl AuthError {
    pub fn sql_state(&self) -> &'static str {
        match self {
            AuthError::NoPrivilege { privilege: PrivilegeKind::Execute, .. } => "42504",
            AuthError::NoPrivilege { missing_columns: Some(_), .. } => "42502",
            AuthError::NoPrivilege { .. } => "42500",
            AuthError::GrantorNotOwner { .. } => "42506",
            AuthError::SchemaNotOwned { .. } => "42507",
            AuthError::SelfGrantRevoke { .. }
            | AuthError::OwnerPrivilegeImmutable { .. }
            | AuthError::SystemObjectProtected { .. } => "42509",
            AuthError::DependentsExist { .. } => "X0Y25",
            AuthError::UnsupportedGrantTarget { .. } => "0A000",
            AuthError::RoleAdministration { .. } => "4251A",
            AuthError::RoleNotGranted { .. } => "0P000",
            AuthError::PublicRole => "4251B",
        }
    }
}

/// Errors returned by statement execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Column '{column}' of '{table}' cannot accept a NULL value")]
    NotNullViolation { column: String, table: String },
    #[error("Statement violates foreign key constraint '{constraint}' on '{table}'")]
    ForeignKeyViolation { constraint: String, table: String },
    #[error("Statement would create a duplicate key in unique or primary key constraint '{constraint}' on '{table}'")]
    UniqueViolation { constraint: String, table: String },
    #[error("Statement violates check constraint '{constraint}' on '{table}'")]
    CheckViolation { constraint: String, table: String },
    #[error("Invalid statement: {0}")]
    InvalidStatement(String),
    #[error("The number of values assigned ({provided}) is not the same as the number of columns ({expected})")]
    ColumnCountMismatch { expected: usize, provided: usize },
    #[error("Value for column '{column}' is not of type {expected}")]
    TypeMismatch { column: String, expected: &'static str },
    #[error("View '{0}' is not updatable")]
    ReadOnlyView(String),
    #[error("'{0}' is a system table; its contents cannot be modified")]
    SystemTableReadOnly(String),
    #[error("'{0}' cannot reference objects in the SESSION schema")]
    SessionSchemaReference(String),
    #[error("Function '{0}' attempted to modify data")]
    RoutineModifiesData(String),
    #[error("Maximum trigger nesting depth {depth} exceeded")]
    TriggerDepthExceeded { depth: usize },
    #[error("Statement nesting depth {depth} exceeded; check for recursive routines")]
    NestingTooDeep { depth: usize },
}

impl ExecutorError {
    pub fn sql_state(&self) -> &'static str {
        match self {
            ExecutorError::Auth(err) => err.sql_state(),
            ExecutorError::Catalog(err) => err.sql_state(),
            ExecutorError::Storage(err) => err.sql_state(),
            ExecutorError::NotNullViolation { .. } => "23502",
            ExecutorError::ForeignKeyViolation { .. } => "23503",
            ExecutorError::UniqueViolation { .. } => "23505",
            ExecutorError::CheckViolation { .. } => "23513",
            ExecutorError::InvalidStatement(_) => "42X01",
            ExecutorError::ColumnCountMismatch { .. } => "42802",
            ExecutorError::TypeMismatch { .. } => "42821",
            ExecutorError::ReadOnlyView(_) => "42Y24",
            ExecutorError::SystemTableReadOnly(_) => "42Y25",
            ExecutorError::SessionSchemaReference(_) => "XCL51",
            ExecutorError::RoutineModifiesData(_) => "38002",
            ExecutorError::TriggerDepthExceeded { .. } => "54038",
            ExecutorError::NestingTooDeep { .. } => "54001",
        }
    }
}
