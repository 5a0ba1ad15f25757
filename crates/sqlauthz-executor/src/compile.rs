//! Statement compilation: resolve names, then work out which privileges a
//! statement needs.
//!
//! The same requirements are checked at run time for the current principal
//! and at CREATE VIEW / CREATE TRIGGER / ADD CONSTRAINT time for the definer,
//! where the records that satisfy them become dependency edges.

use sqlauthz_ast::{
    CompareOp, DeleteStmt, Filter, InsertStmt, ObjectName, ProceduralStatement, Projection, Query,
    RoutineKind, SqlValue, TableRef, UpdateStmt,
};
use sqlauthz_catalog::{normalize_identifier, Catalog, ColumnBitset, ObjectId, ObjectRef, PrivilegeKind};

use crate::{
    errors::ExecutorError,
    resolve::{resolve_relation, resolve_routine, RelationTarget, ResolvedRelation},
    temporary::TemporaryTables,
};

/// One privilege a statement needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    pub kind: PrivilegeKind,
    pub target: ObjectRef,
    /// `None` for a table-level request
    pub columns: Option<ColumnBitset>,
}

impl Requirement {
    pub fn table(kind: PrivilegeKind, table: ObjectId) -> Self {
        Requirement { kind, target: ObjectRef::Table(table), columns: None }
    }

    pub fn columns(kind: PrivilegeKind, table: ObjectId, positions: &[usize]) -> Self {
        Requirement {
            kind,
            target: ObjectRef::Table(table),
            columns: Some(ColumnBitset::from_positions(positions.iter().copied())),
        }
    }

    pub fn execute(routine: ObjectId, kind: RoutineKind) -> Self {
        Requirement { kind: PrivilegeKind::Execute, target: ObjectRef::Routine { id: routine, kind }, columns: None }
    }
}

/// A filter bound to a column position of one relation.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundFilter {
    pub relation: usize,
    pub column: usize,
    pub op: CompareOp,
    pub value: SqlValue,
}

impl BoundFilter {
    /// NULL never satisfies a comparison.
    pub fn matches(&self, value: &SqlValue) -> bool {
        compare(value, self.op, &self.value).unwrap_or(false)
    }
}

/// `None` when either side is NULL or the types differ.
pub fn compare(left: &SqlValue, op: CompareOp, right: &SqlValue) -> Option<bool> {
    let ordering = left.sql_cmp(right)?;
    Some(match op {
        CompareOp::Eq => ordering.is_eq(),
        CompareOp::NotEq => ordering.is_ne(),
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::LtEq => ordering.is_le(),
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::GtEq => ordering.is_ge(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// Each relation with the positions it projects
    pub relations: Vec<(ResolvedRelation, Vec<usize>)>,
    pub filter: Option<BoundFilter>,
    /// Functions called, by id
    pub functions: Vec<ObjectId>,
    /// Output column names
    pub columns: Vec<String>,
    pub requirements: Vec<Requirement>,
}

impl CompiledQuery {
    pub fn references_session(&self) -> bool {
        self.relations.iter().any(|(r, _)| matches!(r.target, RelationTarget::Temporary(_)))
    }

    /// The query with every name fully qualified and synonyms replaced by
    /// their targets, so it reads the same objects whatever schema is
    /// current when it runs.
    pub fn qualified(&self, catalog: &Catalog) -> Query {
        let from = self
            .relations
            .iter()
            .map(|(relation, positions)| TableRef {
                name: relation.object_name(),
                projection: Projection::Columns(
                    positions.iter().filter_map(|p| relation.columns.get(*p).cloned()).collect(),
                ),
            })
            .collect();
        let routines = self
            .functions
            .iter()
            .filter_map(|id| catalog.routine(*id))
            .map(|r| ObjectName::qualified(r.schema.clone(), r.name.clone()))
            .collect();
        let filter = self.filter.as_ref().and_then(|f| {
            let (relation, _) = self.relations.get(f.relation)?;
            let column = relation.columns.get(f.column)?.clone();
            Some(Filter { column, op: f.op, value: f.value.clone() })
        });
        Query { from, routines, filter }
    }
}

/// Resolve a query and compute its SELECT and EXECUTE requirements.
pub fn compile_query(
    catalog: &Catalog,
    temp: &TemporaryTables,
    query: &Query,
    default_schema: &str,
) -> Result<CompiledQuery, ExecutorError> {
    if query.from.is_empty() && query.routines.is_empty() {
        return Err(ExecutorError::InvalidStatement("query selects from nothing".to_string()));
    }

    let mut relations = Vec::with_capacity(query.from.len());
    let mut columns = Vec::new();
    for table_ref in &query.from {
        let relation = resolve_relation(catalog, temp, &table_ref.name, default_schema)?;
        let positions = match &table_ref.projection {
            Projection::All => (0..relation.columns.len()).collect(),
            Projection::Columns(names) => relation.column_positions(names)?,
        };
        columns.extend(positions.iter().filter_map(|p| relation.columns.get(*p).cloned()));
        relations.push((relation, positions));
    }

    let filter = match &query.filter {
        Some(filter) => Some(bind_filter(&relations, filter)?),
        None => None,
    };

    let mut functions = Vec::with_capacity(query.routines.len());
    let mut requirements = Vec::new();
    for routine in &query.routines {
        let routine = resolve_routine(catalog, routine, RoutineKind::Function, default_schema)?;
        requirements.push(Requirement::execute(routine.id, RoutineKind::Function));
        functions.push(routine.id);
    }

    for (index, (relation, positions)) in relations.iter().enumerate() {
        let Some(id) = relation.object_id() else { continue };
        let mut read = positions.clone();
        if let Some(filter) = filter.as_ref().filter(|f| f.relation == index) {
            if !read.contains(&filter.column) {
                read.push(filter.column);
            }
        }
        requirements.push(Requirement::columns(PrivilegeKind::Select, id, &read));
    }

    Ok(CompiledQuery { relations, filter, functions, columns, requirements })
}

fn bind_filter(
    relations: &[(ResolvedRelation, Vec<usize>)],
    filter: &Filter,
) -> Result<BoundFilter, ExecutorError> {
    let name = normalize_identifier(&filter.column);
    relations
        .iter()
        .enumerate()
        .find_map(|(index, (relation, _))| {
            relation.column_index(&name).map(|column| BoundFilter {
                relation: index,
                column,
                op: filter.op,
                value: filter.value.clone(),
            })
        })
        .ok_or_else(|| {
            sqlauthz_catalog::CatalogError::ColumnNotFound {
                column_name: name,
                table_name: relations
                    .first()
                    .map(|(r, _)| r.qualified_name())
                    .unwrap_or_default(),
            }
            .into()
        })
}

/// Resolve the target of INSERT, UPDATE or DELETE. Only base and temporary
/// tables accept writes.
pub fn resolve_write_target(
    catalog: &Catalog,
    temp: &TemporaryTables,
    name: &ObjectName,
    default_schema: &str,
) -> Result<ResolvedRelation, ExecutorError> {
    let relation = resolve_relation(catalog, temp, name, default_schema)?;
    match relation.target {
        RelationTarget::Table(_) | RelationTarget::Temporary(_) => Ok(relation),
        RelationTarget::SystemTable(_) => Err(ExecutorError::SystemTableReadOnly(relation.qualified_name())),
        RelationTarget::View(_) => Err(ExecutorError::ReadOnlyView(relation.qualified_name())),
    }
}

/// Compiled INSERT, UPDATE or DELETE.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledWrite {
    pub target: ResolvedRelation,
    /// Columns written: INSERT column list or UPDATE assignments
    pub columns: Vec<usize>,
    pub filter: Option<BoundFilter>,
    pub requirements: Vec<Requirement>,
}

pub fn compile_insert(
    catalog: &Catalog,
    temp: &TemporaryTables,
    stmt: &InsertStmt,
    default_schema: &str,
) -> Result<CompiledWrite, ExecutorError> {
    let target = resolve_write_target(catalog, temp, &stmt.table, default_schema)?;
    let columns = match &stmt.columns {
        Some(names) => target.column_positions(names)?,
        None => (0..target.columns.len()).collect(),
    };
    let requirements = target
        .object_id()
        .map(|id| vec![Requirement::table(PrivilegeKind::Insert, id)])
        .unwrap_or_default();
    Ok(CompiledWrite { target, columns, filter: None, requirements })
}

pub fn compile_update(
    catalog: &Catalog,
    temp: &TemporaryTables,
    stmt: &UpdateStmt,
    default_schema: &str,
) -> Result<CompiledWrite, ExecutorError> {
    if stmt.assignments.is_empty() {
        return Err(ExecutorError::InvalidStatement("UPDATE without assignments".to_string()));
    }
    let target = resolve_write_target(catalog, temp, &stmt.table, default_schema)?;
    let names: Vec<String> = stmt.assignments.iter().map(|(c, _)| c.clone()).collect();
    let columns = target.column_positions(&names)?;
    let filter = bind_write_filter(&target, stmt.filter.as_ref())?;
    let mut requirements = Vec::new();
    if let Some(id) = target.object_id() {
        requirements.push(Requirement::columns(PrivilegeKind::Update, id, &columns));
        if let Some(filter) = &filter {
            requirements.push(Requirement::columns(PrivilegeKind::Select, id, &[filter.column]));
        }
    }
    Ok(CompiledWrite { target, columns, filter, requirements })
}

pub fn compile_delete(
    catalog: &Catalog,
    temp: &TemporaryTables,
    stmt: &DeleteStmt,
    default_schema: &str,
) -> Result<CompiledWrite, ExecutorError> {
    let target = resolve_write_target(catalog, temp, &stmt.table, default_schema)?;
    let filter = bind_write_filter(&target, stmt.filter.as_ref())?;
    let mut requirements = Vec::new();
    if let Some(id) = target.object_id() {
        requirements.push(Requirement::table(PrivilegeKind::Delete, id));
        if let Some(filter) = &filter {
            requirements.push(Requirement::columns(PrivilegeKind::Select, id, &[filter.column]));
        }
    }
    Ok(CompiledWrite { target, columns: Vec::new(), filter, requirements })
}

fn bind_write_filter(
    target: &ResolvedRelation,
    filter: Option<&Filter>,
) -> Result<Option<BoundFilter>, ExecutorError> {
    let Some(filter) = filter else { return Ok(None) };
    let column = target.column_positions(std::slice::from_ref(&filter.column))?[0];
    Ok(Some(BoundFilter { relation: 0, column, op: filter.op, value: filter.value.clone() }))
}

/// A trigger action or routine body statement, compiled.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledStatement {
    Select(CompiledQuery),
    Write(CompiledWrite),
    Call(ObjectId),
}

impl CompiledStatement {
    pub fn requirements(&self) -> Vec<Requirement> {
        match self {
            CompiledStatement::Select(query) => query.requirements.clone(),
            CompiledStatement::Write(write) => write.requirements.clone(),
            CompiledStatement::Call(id) => vec![Requirement::execute(*id, RoutineKind::Procedure)],
        }
    }

    pub fn references_session(&self) -> bool {
        match self {
            CompiledStatement::Select(query) => query.references_session(),
            CompiledStatement::Write(write) => matches!(write.target.target, RelationTarget::Temporary(_)),
            CompiledStatement::Call(_) => false,
        }
    }
}

pub fn compile_statement(
    catalog: &Catalog,
    temp: &TemporaryTables,
    stmt: &ProceduralStatement,
    default_schema: &str,
) -> Result<CompiledStatement, ExecutorError> {
    Ok(match stmt {
        ProceduralStatement::Select(query) => {
            CompiledStatement::Select(compile_query(catalog, temp, query, default_schema)?)
        }
        ProceduralStatement::Insert(insert) => {
            CompiledStatement::Write(compile_insert(catalog, temp, insert, default_schema)?)
        }
        ProceduralStatement::Update(update) => {
            CompiledStatement::Write(compile_update(catalog, temp, update, default_schema)?)
        }
        ProceduralStatement::Delete(delete) => {
            CompiledStatement::Write(compile_delete(catalog, temp, delete, default_schema)?)
        }
        ProceduralStatement::Call(call) => {
            let routine = resolve_routine(catalog, &call.procedure, RoutineKind::Procedure, default_schema)?;
            CompiledStatement::Call(routine.id)
        }
    })
}

/// Rewrite a procedural statement with fully qualified names.
pub fn qualify_statement(
    catalog: &Catalog,
    stmt: &ProceduralStatement,
    compiled: &CompiledStatement,
) -> ProceduralStatement {
    match (stmt, compiled) {
        (_, CompiledStatement::Select(query)) => ProceduralStatement::Select(query.qualified(catalog)),
        (ProceduralStatement::Insert(insert), CompiledStatement::Write(write)) => {
            ProceduralStatement::Insert(InsertStmt { table: write.target.object_name(), ..insert.clone() })
        }
        (ProceduralStatement::Update(update), CompiledStatement::Write(write)) => {
            ProceduralStatement::Update(UpdateStmt { table: write.target.object_name(), ..update.clone() })
        }
        (ProceduralStatement::Delete(delete), CompiledStatement::Write(write)) => {
            ProceduralStatement::Delete(DeleteStmt { table: write.target.object_name(), ..delete.clone() })
        }
        (ProceduralStatement::Call(call), CompiledStatement::Call(id)) => {
            let procedure = catalog
                .routine(*id)
                .map(|r| ObjectName::qualified(r.schema.clone(), r.name.clone()))
                .unwrap_or_else(|| call.procedure.clone());
            ProceduralStatement::Call(sqlauthz_ast::CallStmt { procedure })
        }
        (other, _) => other.clone(),
    }
}
