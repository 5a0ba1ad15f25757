//! Executor - authorization-aware statement execution
//!
//! Resolves privileges, applies GRANT and REVOKE with their cascades, and runs
//! DDL, DML, routines and triggers under the right principal.
//!
//! - [`PrivilegeResolver`] decides access and names the records that allowed it
//! - [`GrantExecutor`] and [`RevokeExecutor`] maintain the permission catalog
//! - [`RoleExecutor`] maintains roles and role grants
//! - [`SecurityContext`] is the definer/invoker frame stack
//! - [`Session`] executes statements, transactions and cursors

mod alter;
mod compile;
pub mod config;
mod constraint_validator;
pub mod context;
mod create_table;
mod cursor;
mod delete;
mod drop;
pub mod errors;
mod exec_context;
mod grant;
mod insert;
mod logging;
pub mod privilege_resolver;
mod procedural;
mod resolve;
pub mod result;
mod revoke;
mod role_ddl;
mod routine_ddl;
mod schema_ddl;
mod select;
mod session;
mod system_tables;
mod temporary;
mod trigger_ddl;
mod trigger_execution;
mod update;
mod view_ddl;

pub use alter::AlterTableExecutor;
pub use config::{ConfigError, EngineConfig, ExecutionConfig, LoggingConfig, SecurityConfig};
pub use context::{Frame, FrameKind, SecurityContext};
pub use create_table::CreateTableExecutor;
pub use cursor::Cursor;
pub use delete::DeleteExecutor;
pub use drop::DropExecutor;
pub use errors::{AuthError, ExecutorError};
pub use exec_context::ExecContext;
pub use grant::GrantExecutor;
pub use insert::InsertExecutor;
pub use logging::init_logging;
pub use privilege_resolver::{Access, Authorization, DenialReason, PrivilegeResolver};
pub use procedural::RoutineExecutor;
pub use result::{Outcome, ResultSet, StatementResult, Warning, WarningKind};
pub use revoke::RevokeExecutor;
pub use role_ddl::RoleExecutor;
pub use routine_ddl::{RoutineDdlExecutor, SynonymExecutor};
pub use schema_ddl::SchemaExecutor;
pub use select::SelectExecutor;
pub use session::{Engine, Session};
pub use trigger_ddl::TriggerDdlExecutor;
pub use trigger_execution::TriggerExecutor;
pub use update::UpdateExecutor;
pub use view_ddl::ViewExecutor;

#[cfg(test)]
mod tests;
