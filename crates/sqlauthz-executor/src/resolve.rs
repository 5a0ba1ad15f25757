//! Name resolution for relations, routines and columns.

use sqlauthz_ast::{ObjectName, RoutineKind};
use sqlauthz_catalog::{
    errors::CatalogError, normalize_identifier, Catalog, ObjectId, RelationKind,
    RoutineDefinition, SESSION_SCHEMA, SYSTEM_FUNCTION_SCHEMA,
};

use crate::{errors::ExecutorError, temporary::TemporaryTables};

/// Synonym chains longer than this are treated as unresolvable.
const MAX_SYNONYM_HOPS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationTarget {
    Table(ObjectId),
    SystemTable(ObjectId),
    View(ObjectId),
    Temporary(String),
}

/// A relation after synonym resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRelation {
    pub target: RelationTarget,
    pub schema: String,
    pub name: String,
    pub columns: Vec<String>,
}

impl ResolvedRelation {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    pub fn object_name(&self) -> ObjectName {
        ObjectName::qualified(self.schema.clone(), self.name.clone())
    }

    /// Catalog id; `None` for temporary tables.
    pub fn object_id(&self) -> Option<ObjectId> {
        match &self.target {
            RelationTarget::Table(id) | RelationTarget::SystemTable(id) | RelationTarget::View(id) => {
                Some(*id)
            }
            RelationTarget::Temporary(_) => None,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Positions of `names` (normalized here).
    pub fn column_positions(&self, names: &[String]) -> Result<Vec<usize>, ExecutorError> {
        names
            .iter()
            .map(|name| {
                let name = normalize_identifier(name);
                self.column_index(&name).ok_or_else(|| {
                    CatalogError::ColumnNotFound { column_name: name, table_name: self.qualified_name() }
                        .into()
                })
            })
            .collect()
    }
}

/// Split `name` into normalized `(schema, name)`.
pub fn qualify(name: &ObjectName, default_schema: &str) -> (String, String) {
    let schema = name.schema.as_deref().map(normalize_identifier);
    (schema.unwrap_or_else(|| default_schema.to_string()), normalize_identifier(&name.name))
}

pub fn resolve_relation(
    catalog: &Catalog,
    temp: &TemporaryTables,
    name: &ObjectName,
    default_schema: &str,
) -> Result<ResolvedRelation, ExecutorError> {
    let (mut schema, mut relation) = qualify(name, default_schema);
    for _ in 0..MAX_SYNONYM_HOPS {
        if schema == SESSION_SCHEMA {
            let table = temp
                .get(&relation)
                .ok_or_else(|| CatalogError::TableNotFound(format!("{}.{}", schema, relation)))?;
            return Ok(ResolvedRelation {
                target: RelationTarget::Temporary(relation),
                schema,
                name: table.name.clone(),
                columns: table.columns.iter().map(|c| c.name.clone()).collect(),
            });
        }
        catalog.schema_owner(&schema)?;
        let (id, kind) = catalog
            .lookup_relation(&schema, &relation)
            .ok_or_else(|| CatalogError::TableNotFound(format!("{}.{}", schema, relation)))?;
        match kind {
            RelationKind::Table => {
                let table = catalog.table(id).ok_or_else(|| CatalogError::TableNotFound(id.to_string()))?;
                let target = if table.is_system() {
                    RelationTarget::SystemTable(id)
                } else {
                    RelationTarget::Table(id)
                };
                return Ok(ResolvedRelation { target, schema, name: relation, columns: table.column_names() });
            }
            RelationKind::View => {
                let view = catalog.view(id).ok_or_else(|| CatalogError::TableNotFound(id.to_string()))?;
                return Ok(ResolvedRelation {
                    target: RelationTarget::View(id),
                    schema,
                    name: relation,
                    columns: view.columns.clone(),
                });
            }
            RelationKind::Synonym => {
                let synonym =
                    catalog.synonym(id).ok_or_else(|| CatalogError::TableNotFound(id.to_string()))?;
                (schema, relation) = qualify(&synonym.target, &synonym.schema);
            }
        }
    }
    Err(CatalogError::TableNotFound(format!("{}.{}", schema, relation)).into())
}

/// Resolve a routine. Unqualified function names fall back to `SYSFUN`.
pub fn resolve_routine<'c>(
    catalog: &'c Catalog,
    name: &ObjectName,
    kind: RoutineKind,
    default_schema: &str,
) -> Result<&'c RoutineDefinition, ExecutorError> {
    let (schema, routine) = qualify(name, default_schema);
    if name.schema.is_none() {
        let fallback = match kind {
            RoutineKind::Function => catalog.lookup_routine(SYSTEM_FUNCTION_SCHEMA, &routine, kind),
            RoutineKind::Procedure => None,
        };
        if let Some(found) = catalog.lookup_routine(&schema, &routine, kind).or(fallback) {
            return Ok(found);
        }
        return Err(CatalogError::RoutineNotFound {
            kind: kind.name(),
            name: format!("{}.{}", schema, routine),
        }
        .into());
    }
    Ok(catalog.find_routine(&schema, &routine, kind)?)
}
