//! Row-level checks run before a write is applied: column types, NOT NULL,
//! primary and unique keys, foreign keys on both sides, and CHECK
//! constraints.
//!
//! Validation works on the prospective content of the written table, so a
//! statement either applies completely or not at all.

use std::collections::HashSet;

use sqlauthz_ast::{DataType, SqlValue};
use sqlauthz_catalog::{ColumnSchema, ConstraintKind, ObjectId, TableSchema};
use sqlauthz_storage::{DatabaseState, Row};

use crate::{compile::compare, errors::ExecutorError};

/// Type and nullability of each value in `row`. `key_columns` are treated as
/// NOT NULL.
pub fn check_columns(
    table_name: &str,
    columns: &[ColumnSchema],
    key_columns: &[usize],
    row: &Row,
) -> Result<(), ExecutorError> {
    for (position, column) in columns.iter().enumerate() {
        let value = row.get(position).unwrap_or(&SqlValue::Null);
        match (value, column.data_type) {
            (SqlValue::Null, _) => {
                if !column.nullable || key_columns.contains(&position) {
                    return Err(ExecutorError::NotNullViolation {
                        column: column.name.clone(),
                        table: table_name.to_string(),
                    });
                }
            }
            (SqlValue::Integer(_), DataType::Integer) | (SqlValue::Varchar(_), DataType::Varchar) => {}
            (_, expected) => {
                return Err(ExecutorError::TypeMismatch {
                    column: column.name.clone(),
                    expected: type_name(expected),
                });
            }
        }
    }
    Ok(())
}

fn type_name(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Integer => "INTEGER",
        DataType::Varchar => "VARCHAR",
    }
}

/// Validate `rows`, the prospective content of `table`, where `changed`
/// indexes the rows inserted or updated by the statement.
pub fn validate_table(
    state: &DatabaseState,
    table: &TableSchema,
    rows: &[Row],
    changed: &[usize],
) -> Result<(), ExecutorError> {
    let table_name = table.qualified_name();
    let constraints = state.catalog.constraints_on(table.id);
    let primary_key: Vec<usize> = constraints
        .iter()
        .find_map(|c| match &c.kind {
            ConstraintKind::PrimaryKey { columns } => Some(columns.clone()),
            _ => None,
        })
        .unwrap_or_default();

    for index in changed {
        if let Some(row) = rows.get(*index) {
            check_columns(&table_name, &table.columns, &primary_key, row)?;
        }
    }

    for constraint in constraints {
        match &constraint.kind {
            ConstraintKind::PrimaryKey { columns } | ConstraintKind::Unique { columns } => {
                if has_duplicate_key(rows, columns) {
                    return Err(ExecutorError::UniqueViolation {
                        constraint: constraint.name.clone(),
                        table: table_name,
                    });
                }
            }
            ConstraintKind::ForeignKey { columns, parent, parent_columns } => {
                let parent_rows = if *parent == table.id { rows } else { state.rows(*parent) };
                let keys = key_set(parent_rows, parent_columns);
                let orphan = changed
                    .iter()
                    .filter_map(|i| rows.get(*i))
                    .filter_map(|row| key_of(row, columns))
                    .any(|key| !keys.contains(&key));
                if orphan {
                    return Err(ExecutorError::ForeignKeyViolation {
                        constraint: constraint.name.clone(),
                        table: table_name,
                    });
                }
            }
            ConstraintKind::Check { column, op, value, .. } => {
                // NULL makes the comparison unknown, which passes.
                let violated = changed
                    .iter()
                    .filter_map(|i| rows.get(*i))
                    .filter_map(|row| row.get(*column))
                    .any(|actual| compare(actual, *op, value) == Some(false));
                if violated {
                    return Err(ExecutorError::CheckViolation {
                        constraint: constraint.name.clone(),
                        table: table_name,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Foreign keys referencing `table` must still find their parent row in
/// `rows` after an UPDATE or DELETE (RESTRICT semantics).
pub fn validate_referenced(
    state: &DatabaseState,
    table: ObjectId,
    rows: &[Row],
) -> Result<(), ExecutorError> {
    for fk in state.catalog.foreign_keys_referencing(table) {
        let ConstraintKind::ForeignKey { columns, parent_columns, .. } = &fk.kind else { continue };
        let keys = key_set(rows, parent_columns);
        let child_rows = if fk.table == table { rows } else { state.rows(fk.table) };
        if child_rows.iter().filter_map(|row| key_of(row, columns)).any(|key| !keys.contains(&key)) {
            let child = state.catalog.table(fk.table).map(|t| t.qualified_name()).unwrap_or_default();
            return Err(ExecutorError::ForeignKeyViolation { constraint: fk.name.clone(), table: child });
        }
    }
    Ok(())
}

/// Key values of `row`; `None` when any is NULL (such rows are never
/// checked against a key).
fn key_of(row: &Row, columns: &[usize]) -> Option<Vec<SqlValue>> {
    columns
        .iter()
        .map(|c| row.get(*c).filter(|v| !v.is_null()).cloned())
        .collect()
}

fn key_set(rows: &[Row], columns: &[usize]) -> HashSet<Vec<SqlValue>> {
    rows.iter().filter_map(|row| key_of(row, columns)).collect()
}

fn has_duplicate_key(rows: &[Row], columns: &[usize]) -> bool {
    let mut seen = HashSet::new();
    rows.iter().filter_map(|row| key_of(row, columns)).any(|key| !seen.insert(key))
}
