//! CREATE TABLE executor, including table constraints.
//!
//! Foreign keys and CHECK constraints are compiled objects: a foreign key
//! needs REFERENCES on the parent columns and a CHECK needs EXECUTE on the
//! routines it calls, both held by the owner of the child table. The records
//! that satisfied those checks become the constraint's dependency edges.

use sqlauthz_ast::{CreateTableStmt, RoutineKind, TableConstraint, TableConstraintKind};
use sqlauthz_catalog::{
    normalize_identifier, CatalogError, ColumnSchema, ConstraintKind, Dependent, DependentKind,
    ObjectId, PrivilegeKind, SESSION_SCHEMA,
};
use sqlauthz_storage::DatabaseState;
use tracing::debug;

use crate::{
    compile::Requirement,
    constraint_validator::validate_table,
    errors::ExecutorError,
    exec_context::ExecContext,
    resolve::{qualify, resolve_relation, resolve_routine, RelationTarget},
    schema_ddl::prepare_schema,
};

/// Executor for CREATE TABLE
pub struct CreateTableExecutor;

impl CreateTableExecutor {
    pub fn execute(
        state: &mut DatabaseState,
        ctx: &mut ExecContext<'_>,
        stmt: &CreateTableStmt,
    ) -> Result<(), ExecutorError> {
        let (schema, name) = qualify(&stmt.name, &ctx.default_schema);
        let schema = if stmt.temporary && stmt.name.schema.is_none() { SESSION_SCHEMA.to_string() } else { schema };

        let key_columns: Vec<String> = stmt
            .constraints
            .iter()
            .filter_map(|c| match &c.kind {
                TableConstraintKind::PrimaryKey(columns) => Some(columns.iter().map(|c| normalize_identifier(c))),
                _ => None,
            })
            .flatten()
            .collect();
        let columns: Vec<ColumnSchema> = stmt
            .columns
            .iter()
            .map(|def| {
                let name = normalize_identifier(&def.name);
                let nullable = def.nullable && !key_columns.contains(&name);
                ColumnSchema::new(name, def.data_type, nullable)
            })
            .collect();

        if stmt.temporary || schema == SESSION_SCHEMA {
            if !stmt.temporary || schema != SESSION_SCHEMA {
                return Err(ExecutorError::InvalidStatement(
                    "temporary tables must be declared in schema SESSION".to_string(),
                ));
            }
            if !stmt.constraints.is_empty() {
                return Err(ExecutorError::InvalidStatement(
                    "temporary tables do not support constraints".to_string(),
                ));
            }
            ctx.temp.create(&name, columns)?;
            debug!(table = %name, "declared temporary table");
            return Ok(());
        }

        prepare_schema(state, ctx, &schema)?;
        let id = state.catalog.create_table(&schema, &name, columns)?;
        state.create_table_storage(id);
        for constraint in &stmt.constraints {
            add_table_constraint(state, ctx, id, constraint)?;
        }
        Ok(())
    }
}

/// Add one constraint to `table`, validating existing rows against it.
pub(crate) fn add_table_constraint(
    state: &mut DatabaseState,
    ctx: &ExecContext<'_>,
    table: ObjectId,
    constraint: &TableConstraint,
) -> Result<ObjectId, ExecutorError> {
    let child = state
        .catalog
        .table(table)
        .cloned()
        .ok_or_else(|| CatalogError::TableNotFound(table.to_string()))?;
    let name = constraint.name.as_deref().map(normalize_identifier);
    let label = name.clone().unwrap_or_else(|| child.qualified_name());
    let positions = |names: &[String]| -> Result<Vec<usize>, CatalogError> {
        let names: Vec<String> = names.iter().map(|n| normalize_identifier(n)).collect();
        child.column_positions(&names)
    };

    let mut requirements = Vec::new();
    let kind = match &constraint.kind {
        TableConstraintKind::PrimaryKey(columns) => ConstraintKind::PrimaryKey { columns: positions(columns)? },
        TableConstraintKind::Unique(columns) => ConstraintKind::Unique { columns: positions(columns)? },
        TableConstraintKind::ForeignKey { columns, references, referenced_columns } => {
            let columns = positions(columns)?;
            let parent = resolve_relation(&state.catalog, &ctx.temp, references, &ctx.default_schema)?;
            let parent_id = match parent.target {
                RelationTarget::Table(id) => id,
                RelationTarget::Temporary(_) => return Err(ExecutorError::SessionSchemaReference(label)),
                RelationTarget::View(_) | RelationTarget::SystemTable(_) => {
                    return Err(CatalogError::InvalidForeignKey {
                        constraint: label,
                        parent: parent.qualified_name(),
                    }
                    .into());
                }
            };
            let parent_columns = match referenced_columns {
                Some(names) => parent.column_positions(names)?,
                None => state
                    .catalog
                    .primary_key_of(parent_id)
                    .and_then(|pk| pk.kind.key_columns().map(<[usize]>::to_vec))
                    .ok_or_else(|| CatalogError::InvalidForeignKey {
                        constraint: label.clone(),
                        parent: parent.qualified_name(),
                    })?,
            };
            if parent_columns.len() != columns.len() {
                return Err(ExecutorError::InvalidStatement(format!(
                    "foreign key '{}' has {} columns but references {}",
                    label,
                    columns.len(),
                    parent_columns.len()
                )));
            }
            requirements.push(Requirement::columns(PrivilegeKind::References, parent_id, &parent_columns));
            ConstraintKind::ForeignKey { columns, parent: parent_id, parent_columns }
        }
        TableConstraintKind::Check(check) => {
            let column = positions(std::slice::from_ref(&check.column))?[0];
            let mut routines = Vec::with_capacity(check.routines.len());
            for routine in &check.routines {
                let routine = resolve_routine(&state.catalog, routine, RoutineKind::Function, &ctx.default_schema)?;
                requirements.push(Requirement::execute(routine.id, RoutineKind::Function));
                routines.push(routine.id);
            }
            ConstraintKind::Check { column, op: check.op, value: check.value.clone(), routines }
        }
    };

    let owner = state.catalog.schema_owner(&child.schema)?.to_string();
    let providers = ctx.authorize_for(&state.catalog, &owner, &requirements)?;
    let id = state.catalog.add_constraint(&child.schema, name.as_deref(), table, kind)?;

    let rows = state.rows(table).to_vec();
    let all: Vec<usize> = (0..rows.len()).collect();
    if let Some(table_schema) = state.catalog.table(table) {
        validate_table(state, table_schema, &rows, &all)?;
    }

    let dependent = Dependent::new(id, DependentKind::Constraint);
    for provider in providers {
        state.catalog.dependencies_mut().register(dependent, provider);
    }
    debug!(constraint = %id, table = %child.qualified_name(), owner = %owner, "added constraint");
    Ok(id)
}
