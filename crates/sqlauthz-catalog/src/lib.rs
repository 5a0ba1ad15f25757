//! Catalog - Schema Metadata, Permission and Dependency Storage
//!
//! Provides metadata structures for schemas, tables, views, triggers, routines,
//! constraints and synonyms, along with the two stores the authorization layer
//! is built on:
//!
//! - [`PermissionCatalog`] - every table, column and routine privilege record
//! - [`DependencyGraph`] - which compiled objects rely on which records/objects
//!
//! Roles and role grants are kept beside the permission records: a record's
//! grantee may be a role, and a role may be granted to users, to `PUBLIC` or
//! to other roles.
//!
//! Objects live in an arena keyed by [`ObjectId`]; nothing holds a reference to
//! another object, so dropping is always an id invalidation.

mod conglomerate;
mod constraint;
mod dependency;
pub mod errors;
mod ids;
mod permissions;
mod principal;
mod privilege;
mod role;
mod routine;
mod schema;
mod store;
mod synonym;
mod table;
mod trigger;
mod view;

pub use conglomerate::Conglomerate;
pub use constraint::{ConstraintDefinition, ConstraintKind};
pub use dependency::{Dependent, DependentKind, DependencyEdge, DependencyGraph, Provider};
pub use errors::CatalogError;
pub use ids::{ConglomerateId, ObjectId, PermissionRecordId, RoleId};
pub use permissions::{GrantOutcome, PermissionCatalog, RevokeOutcome};
pub use principal::{normalize_identifier, Principal};
pub use privilege::{ColumnBitset, ObjectRef, PermissionRecord, PrivilegeKind};
pub use role::{RoleDefinition, RoleGrant};
pub use routine::RoutineDefinition;
pub use schema::Schema;
pub use store::{Catalog, CatalogObject, DroppedObject, RelationKind, DEFAULT_SCHEMA};
pub use synonym::SynonymDefinition;
pub use table::{ColumnSchema, TableKind, TableSchema};
pub use trigger::TriggerDefinition;
pub use view::ViewDefinition;

/// Schema holding the system catalog tables.
pub const SYSTEM_SCHEMA: &str = "SYS";
/// Schema holding built-in functions.
pub const SYSTEM_FUNCTION_SCHEMA: &str = "SYSFUN";
/// Schema holding system procedures.
pub const SYSTEM_PROCEDURE_SCHEMA: &str = "SYSCS_UTIL";
/// Schema of session-scoped temporary tables.
pub const SESSION_SCHEMA: &str = "SESSION";

#[cfg(test)]
mod tests;
