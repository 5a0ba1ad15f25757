//! ALTER TABLE executor

use sqlauthz_ast::{AlterTableAction, AlterTableStmt};
use sqlauthz_catalog::{normalize_identifier, CatalogError, ColumnSchema, ObjectId};
use sqlauthz_storage::DatabaseState;
use tracing::debug;

use crate::{
    create_table::add_table_constraint,
    errors::ExecutorError,
    exec_context::ExecContext,
    resolve::{resolve_relation, RelationTarget},
    schema_ddl::require_schema_owner,
};

/// Executor for ALTER TABLE
pub struct AlterTableExecutor;

impl AlterTableExecutor {
    pub fn execute(
        state: &mut DatabaseState,
        ctx: &ExecContext<'_>,
        stmt: &AlterTableStmt,
    ) -> Result<(), ExecutorError> {
        let relation = resolve_relation(&state.catalog, &ctx.temp, &stmt.table, &ctx.default_schema)?;
        let table = match relation.target {
            RelationTarget::Table(id) => id,
            RelationTarget::SystemTable(_) => {
                return Err(CatalogError::SystemSchema {
                    operation: "ALTER TABLE".to_string(),
                    schema: relation.schema,
                }
                .into());
            }
            RelationTarget::View(_) | RelationTarget::Temporary(_) => {
                return Err(ExecutorError::InvalidStatement(format!(
                    "'{}' is not a base table",
                    relation.qualified_name()
                )));
            }
        };
        require_schema_owner(state, ctx, &relation.schema)?;

        match &stmt.action {
            AlterTableAction::AddColumn(def) => {
                let name = normalize_identifier(&def.name);
                if !def.nullable && !state.rows(table).is_empty() {
                    return Err(ExecutorError::NotNullViolation {
                        column: name,
                        table: relation.qualified_name(),
                    });
                }
                state.catalog.add_column(table, ColumnSchema::new(name.clone(), def.data_type, def.nullable))?;
                state.add_column_storage(table);
                debug!(table = %relation.qualified_name(), column = %name, "added column");
            }
            AlterTableAction::AddConstraint(constraint) => {
                add_table_constraint(state, ctx, table, constraint)?;
            }
            AlterTableAction::DropConstraint(name) => {
                let id = Self::constraint_on(state, table, &relation.schema, name)?;
                state.catalog.drop_constraint(id)?;
                debug!(table = %relation.qualified_name(), constraint = %name, "dropped constraint");
            }
        }
        Ok(())
    }

    fn constraint_on(
        state: &DatabaseState,
        table: ObjectId,
        schema: &str,
        name: &str,
    ) -> Result<ObjectId, ExecutorError> {
        let name = normalize_identifier(name);
        state
            .catalog
            .lookup_constraint(schema, &name)
            .filter(|c| c.table == table)
            .map(|c| c.id)
            .ok_or_else(|| CatalogError::ObjectNotFound { kind: "CONSTRAINT", name: format!("{}.{}", schema, name) }.into())
    }
}
