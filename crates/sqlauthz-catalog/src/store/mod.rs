//! Database catalog store - every schema object, permission record and
//! dependency edge.
//!
//! Objects live in one arena keyed by [`ObjectId`]. Name lookups go through
//! per-namespace maps:
//!
//! - `relations` - tables, views and synonyms share a namespace per schema
//! - `routines` - functions and procedures, keyed by kind
//! - `triggers` and `constraints` - one namespace each per schema
//!
//! Roles live outside schemas, keyed by name, with their grants keyed by
//! `(role, grantee)`.
//!
//! Operations are split into submodules by object type; `drops` holds the
//! RESTRICT checks and the removal of invalidated dependents.

use std::collections::BTreeMap;

use sqlauthz_ast::{DataType, RoutineKind};

use crate::{
    errors::CatalogError, Conglomerate, ConglomerateId, ConstraintDefinition, DependencyGraph,
    ObjectId, PermissionCatalog, Principal, RoleDefinition, RoleGrant, RoutineDefinition, Schema,
    SynonymDefinition, TableSchema, TriggerDefinition, ViewDefinition, SYSTEM_FUNCTION_SCHEMA, SYSTEM_PROCEDURE_SCHEMA,
    SYSTEM_SCHEMA,
};

mod constraints;
mod drops;
mod roles;
mod routines;
mod schemas;
mod synonyms;
mod tables;
mod triggers;
mod views;

pub use drops::DroppedObject;

/// Default schema of every database, owned by the DBA.
pub const DEFAULT_SCHEMA: &str = "APP";

/// System catalog tables and their columns, created at bootstrap.
pub(crate) const SYSTEM_TABLES: &[(&str, &[&str])] = &[
    ("SYSSCHEMAS", &["SCHEMANAME", "AUTHORIZATIONID"]),
    ("SYSTABLES", &["TABLENAME", "TABLETYPE", "SCHEMANAME"]),
    (
        "SYSTABLEPERMS",
        &[
            "GRANTEE",
            "GRANTOR",
            "TABLENAME",
            "SELECTPRIV",
            "DELETEPRIV",
            "INSERTPRIV",
            "UPDATEPRIV",
            "REFERENCESPRIV",
            "TRIGGERPRIV",
        ],
    ),
    ("SYSCOLPERMS", &["GRANTEE", "GRANTOR", "TABLENAME", "TYPE", "COLUMNS"]),
    ("SYSROUTINEPERMS", &["GRANTEE", "GRANTOR", "ALIAS", "GRANTOPTION"]),
    ("SYSDEPENDS", &["DEPENDENTID", "DEPENDENTTYPE", "PROVIDERID", "PROVIDERTYPE"]),
    ("SYSCONSTRAINTS", &["CONSTRAINTNAME", "TABLENAME", "TYPE", "SCHEMANAME"]),
    ("SYSROLES", &["ROLEID", "GRANTEE", "GRANTOR", "ISDEF"]),
];

/// System procedures in `SYSCS_UTIL`.
pub(crate) const SYSTEM_PROCEDURES: &[&str] = &[
    "SYSCS_SET_DATABASE_PROPERTY",
    "SYSCS_COMPRESS_TABLE",
    "SYSCS_CHECKPOINT_DATABASE",
    "SYSCS_FREEZE_DATABASE",
    "SYSCS_UNFREEZE_DATABASE",
    "SYSCS_BACKUP_DATABASE",
    "SYSCS_EXPORT_TABLE",
    "SYSCS_IMPORT_TABLE",
    "SYSCS_SET_RUNTIMESTATISTICS",
];

/// System functions in `SYSCS_UTIL`.
pub(crate) const SYSTEM_FUNCTIONS: &[&str] =
    &["SYSCS_GET_DATABASE_PROPERTY", "SYSCS_CHECK_TABLE", "SYSCS_GET_RUNTIMESTATISTICS"];

/// Anything stored in the object arena.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogObject {
    Table(TableSchema),
    View(ViewDefinition),
    Trigger(TriggerDefinition),
    Routine(RoutineDefinition),
    Constraint(ConstraintDefinition),
    Synonym(SynonymDefinition),
}

impl CatalogObject {
    pub fn id(&self) -> ObjectId {
        match self {
            CatalogObject::Table(t) => t.id,
            CatalogObject::View(v) => v.id,
            CatalogObject::Trigger(t) => t.id,
            CatalogObject::Routine(r) => r.id,
            CatalogObject::Constraint(c) => c.id,
            CatalogObject::Synonym(s) => s.id,
        }
    }

    pub fn schema(&self) -> &str {
        match self {
            CatalogObject::Table(t) => &t.schema,
            CatalogObject::View(v) => &v.schema,
            CatalogObject::Trigger(t) => &t.schema,
            CatalogObject::Routine(r) => &r.schema,
            CatalogObject::Constraint(c) => &c.schema,
            CatalogObject::Synonym(s) => &s.schema,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CatalogObject::Table(t) => &t.name,
            CatalogObject::View(v) => &v.name,
            CatalogObject::Trigger(t) => &t.name,
            CatalogObject::Routine(r) => &r.name,
            CatalogObject::Constraint(c) => &c.name,
            CatalogObject::Synonym(s) => &s.name,
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema(), self.name())
    }

    /// Object type as named in messages and `SYSDEPENDS`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            CatalogObject::Table(_) => "TABLE",
            CatalogObject::View(_) => "VIEW",
            CatalogObject::Trigger(_) => "TRIGGER",
            CatalogObject::Routine(r) => r.kind.name(),
            CatalogObject::Constraint(_) => "CONSTRAINT",
            CatalogObject::Synonym(_) => "SYNONYM",
        }
    }
}

/// What a name in the relation namespace refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Table,
    View,
    Synonym,
}

/// Database catalog - manages all schemas and their objects.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub(crate) dba: String,
    pub(crate) schemas: BTreeMap<String, Schema>,
    pub(crate) objects: BTreeMap<ObjectId, CatalogObject>,
    pub(crate) relations: BTreeMap<(String, String), ObjectId>,
    pub(crate) routines: BTreeMap<(String, String, RoutineKind), ObjectId>,
    pub(crate) triggers: BTreeMap<(String, String), ObjectId>,
    pub(crate) constraints: BTreeMap<(String, String), ObjectId>,
    pub(crate) conglomerates: BTreeMap<ConglomerateId, Conglomerate>,
    pub(crate) permissions: PermissionCatalog,
    pub(crate) dependencies: DependencyGraph,
    pub(crate) roles: BTreeMap<String, RoleDefinition>,
    pub(crate) role_grants: BTreeMap<(String, Principal), RoleGrant>,
    next_object: u64,
    next_conglomerate: u64,
    next_role: u64,
}

impl Catalog {
    /// Create a catalog with the system schemas, system tables and system
    /// procedures, all owned by `dba`.
    pub fn new(dba: &str) -> Self {
        let mut catalog = Catalog {
            dba: dba.to_string(),
            schemas: BTreeMap::new(),
            objects: BTreeMap::new(),
            relations: BTreeMap::new(),
            routines: BTreeMap::new(),
            triggers: BTreeMap::new(),
            constraints: BTreeMap::new(),
            conglomerates: BTreeMap::new(),
            permissions: PermissionCatalog::new(),
            dependencies: DependencyGraph::new(),
            roles: BTreeMap::new(),
            role_grants: BTreeMap::new(),
            next_object: 0,
            next_conglomerate: 0,
            next_role: 0,
        };

        for name in [SYSTEM_SCHEMA, SYSTEM_FUNCTION_SCHEMA, SYSTEM_PROCEDURE_SCHEMA] {
            catalog
                .schemas
                .insert(name.to_string(), Schema::system(name.to_string(), dba.to_string()));
        }
        catalog
            .schemas
            .insert(DEFAULT_SCHEMA.to_string(), Schema::new(DEFAULT_SCHEMA.to_string(), dba.to_string()));

        for (name, columns) in SYSTEM_TABLES {
            let columns = columns
                .iter()
                .map(|c| crate::ColumnSchema::new(c.to_string(), DataType::Varchar, true))
                .collect();
            catalog.insert_system_table(name, columns);
        }
        for name in SYSTEM_PROCEDURES {
            catalog.insert_system_routine(SYSTEM_PROCEDURE_SCHEMA, name, RoutineKind::Procedure);
        }
        for name in SYSTEM_FUNCTIONS {
            catalog.insert_system_routine(SYSTEM_PROCEDURE_SCHEMA, name, RoutineKind::Function);
        }
        catalog
    }

    /// The database owner.
    pub fn dba(&self) -> &str {
        &self.dba
    }

    pub fn permissions(&self) -> &PermissionCatalog {
        &self.permissions
    }

    pub fn permissions_mut(&mut self) -> &mut PermissionCatalog {
        &mut self.permissions
    }

    pub fn dependencies(&self) -> &DependencyGraph {
        &self.dependencies
    }

    pub fn dependencies_mut(&mut self) -> &mut DependencyGraph {
        &mut self.dependencies
    }

    pub fn object(&self, id: ObjectId) -> Option<&CatalogObject> {
        self.objects.get(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &CatalogObject> {
        self.objects.values()
    }

    /// Owner of `id`: the owner of the schema it lives in. For views and
    /// triggers this is also the definer whose privileges they run with.
    pub fn owner_of(&self, id: ObjectId) -> Option<&str> {
        let object = self.objects.get(&id)?;
        self.schemas.get(object.schema()).map(|s| s.owner.as_str())
    }

    pub(crate) fn allocate_object_id(&mut self) -> ObjectId {
        self.next_object += 1;
        ObjectId(self.next_object)
    }

    pub(crate) fn allocate_conglomerate_id(&mut self) -> ConglomerateId {
        self.next_conglomerate += 1;
        ConglomerateId(self.next_conglomerate)
    }

    /// Fail unless `schema` exists and accepts user DDL.
    pub(crate) fn check_user_schema(&self, schema: &str, operation: &str) -> Result<(), CatalogError> {
        let found = self
            .schemas
            .get(schema)
            .ok_or_else(|| CatalogError::SchemaNotFound(schema.to_string()))?;
        if found.system {
            return Err(CatalogError::SystemSchema {
                operation: operation.to_string(),
                schema: schema.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new("DBA")
    }
}
