//! GRANT statement executor
//!
//! `Validate → Authorize → Apply`. Target validation and privilege expansion
//! are shared with REVOKE.

use sqlauthz_ast::{GrantStmt, Grantee, ObjectName, ObjectType, PrivilegeType, RoutineKind};
use sqlauthz_catalog::{
    normalize_identifier, Catalog, CatalogError, ColumnBitset, ObjectId, ObjectRef, Principal,
    PrivilegeKind, RelationKind, SESSION_SCHEMA, SYSTEM_PROCEDURE_SCHEMA,
};
use sqlauthz_storage::DatabaseState;
use tracing::info;

use crate::{
    compile::compile_query,
    errors::{AuthError, ExecutorError},
    exec_context::ExecContext,
    privilege_resolver::{Access, Authorization},
    resolve::qualify,
    temporary::TemporaryTables,
};

/// The single object a GRANT or REVOKE names, validated.
#[derive(Debug, Clone)]
pub(crate) struct GrantTarget {
    pub object: ObjectRef,
    pub name: String,
    /// Owner of the object's schema
    pub owner: String,
    /// Set when the target is a view
    pub view: Option<ObjectId>,
    /// Column names of a table or view, in order
    pub columns: Vec<String>,
}

impl GrantTarget {
    pub fn resolve(
        catalog: &Catalog,
        ctx: &ExecContext<'_>,
        object_type: ObjectType,
        objects: &[ObjectName],
    ) -> Result<GrantTarget, ExecutorError> {
        let [object] = objects else {
            return Err(ExecutorError::InvalidStatement(
                "GRANT and REVOKE take exactly one object".to_string(),
            ));
        };
        let (schema, name) = qualify(object, &ctx.default_schema);
        let qualified = format!("{}.{}", schema, name);

        let target = match object_type {
            ObjectType::Table => {
                if schema == SESSION_SCHEMA {
                    return Err(AuthError::UnsupportedGrantTarget { kind: "TEMPORARY TABLE", object: qualified }.into());
                }
                let owner = catalog.schema_owner(&schema)?.to_string();
                let (id, kind) = catalog
                    .lookup_relation(&schema, &name)
                    .ok_or_else(|| CatalogError::TableNotFound(qualified.clone()))?;
                match kind {
                    RelationKind::Synonym => {
                        return Err(AuthError::UnsupportedGrantTarget { kind: "SYNONYM", object: qualified }.into());
                    }
                    RelationKind::Table => {
                        let table = catalog.table(id).ok_or_else(|| CatalogError::TableNotFound(qualified.clone()))?;
                        if table.is_system() {
                            return Err(AuthError::SystemObjectProtected { object: qualified }.into());
                        }
                        GrantTarget {
                            object: ObjectRef::Table(id),
                            name: qualified,
                            owner,
                            view: None,
                            columns: table.column_names(),
                        }
                    }
                    RelationKind::View => {
                        let view = catalog.view(id).ok_or_else(|| CatalogError::TableNotFound(qualified.clone()))?;
                        GrantTarget {
                            object: ObjectRef::Table(id),
                            name: qualified,
                            owner,
                            view: Some(id),
                            columns: view.columns.clone(),
                        }
                    }
                }
            }
            ObjectType::Function | ObjectType::Procedure => {
                let kind = match object_type {
                    ObjectType::Function => RoutineKind::Function,
                    _ => RoutineKind::Procedure,
                };
                let routine = catalog.find_routine(&schema, &name, kind)?;
                let grantable = schema == SYSTEM_PROCEDURE_SCHEMA
                    && ctx.config.security.is_grantable_system_routine(&qualified);
                if routine.system && !grantable {
                    return Err(AuthError::SystemObjectProtected { object: qualified }.into());
                }
                GrantTarget {
                    object: ObjectRef::Routine { id: routine.id, kind },
                    name: qualified,
                    owner: catalog.schema_owner(&schema)?.to_string(),
                    view: None,
                    columns: Vec::new(),
                }
            }
        };
        Ok(target)
    }

    /// Expand the privilege list into kinds with optional column sets.
    pub fn privileges(
        &self,
        privileges: &[PrivilegeType],
    ) -> Result<Vec<(PrivilegeKind, Option<ColumnBitset>)>, ExecutorError> {
        if privileges.is_empty() {
            return Err(ExecutorError::InvalidStatement("no privileges named".to_string()));
        }
        let routine = matches!(self.object, ObjectRef::Routine { .. });
        let mut expanded = Vec::new();
        for privilege in privileges {
            let kind = match (privilege, routine) {
                (PrivilegeType::AllPrivileges, true) | (PrivilegeType::Execute, true) => {
                    expanded.push((PrivilegeKind::Execute, None));
                    continue;
                }
                (PrivilegeType::AllPrivileges, false) => {
                    expanded.extend(PrivilegeKind::TABLE_KINDS.iter().map(|k| (*k, None)));
                    continue;
                }
                (PrivilegeType::Select(_), false) => PrivilegeKind::Select,
                (PrivilegeType::Insert, false) => PrivilegeKind::Insert,
                (PrivilegeType::Update(_), false) => PrivilegeKind::Update,
                (PrivilegeType::Delete, false) => PrivilegeKind::Delete,
                (PrivilegeType::References(_), false) => PrivilegeKind::References,
                (PrivilegeType::Trigger, false) => PrivilegeKind::Trigger,
                (other, _) => {
                    return Err(ExecutorError::InvalidStatement(format!(
                        "{} privilege does not apply to '{}'",
                        other, self.name
                    )));
                }
            };
            let columns = match privilege.columns() {
                Some(names) => Some(self.column_bitset(names)?),
                None => None,
            };
            expanded.push((kind, columns));
        }
        Ok(expanded)
    }

    fn column_bitset(&self, names: &[String]) -> Result<ColumnBitset, ExecutorError> {
        let mut bitset = ColumnBitset::new();
        for name in names {
            let name = normalize_identifier(name);
            let position = self.columns.iter().position(|c| *c == name).ok_or_else(|| {
                CatalogError::ColumnNotFound { column_name: name.clone(), table_name: self.name.clone() }
            })?;
            bitset.insert(position);
        }
        Ok(bitset)
    }
}

/// A grantee that names an existing role is that role; any other name is a
/// user.
pub(crate) fn principal_of(catalog: &Catalog, grantee: &Grantee) -> Principal {
    match grantee {
        Grantee::User(name) => {
            let name = normalize_identifier(name);
            if catalog.role(&name).is_some() {
                Principal::Role(name)
            } else {
                Principal::User(name)
            }
        }
        Grantee::Public => Principal::Public,
    }
}

/// Reject grantees that are the caller, the object's owner or the DBA.
pub(crate) fn check_grantees(
    catalog: &Catalog,
    caller: &str,
    target: &GrantTarget,
    grantees: &[Grantee],
) -> Result<Vec<Principal>, ExecutorError> {
    if grantees.is_empty() {
        return Err(ExecutorError::InvalidStatement("no grantees named".to_string()));
    }
    let mut principals = Vec::with_capacity(grantees.len());
    for grantee in grantees {
        let principal = principal_of(catalog, grantee);
        if let Principal::User(name) = &principal {
            if name == caller {
                return Err(AuthError::SelfGrantRevoke { principal: name.clone() }.into());
            }
            if *name == target.owner || name == catalog.dba() {
                return Err(AuthError::OwnerPrivilegeImmutable {
                    principal: name.clone(),
                    object: target.name.clone(),
                }
                .into());
            }
        }
        if !principals.contains(&principal) {
            principals.push(principal);
        }
    }
    Ok(principals)
}

/// Executor for GRANT statements
pub struct GrantExecutor;

impl GrantExecutor {
    pub fn execute_grant(
        state: &mut DatabaseState,
        ctx: &ExecContext<'_>,
        stmt: &GrantStmt,
    ) -> Result<(), ExecutorError> {
        // Validate
        let target = GrantTarget::resolve(&state.catalog, ctx, stmt.object_type, &stmt.objects)?;
        let privileges = target.privileges(&stmt.privileges)?;
        let grantor = ctx.principal();
        let grantees = check_grantees(&state.catalog, &grantor, &target, &stmt.grantees)?;
        if let Some(role) = grantees.iter().find_map(Principal::role_name).filter(|_| stmt.with_grant_option) {
            return Err(ExecutorError::InvalidStatement(format!(
                "WITH GRANT OPTION cannot be granted to role '{}'",
                role
            )));
        }

        // Authorize
        {
            let resolver = ctx.resolver(&state.catalog);
            for (kind, columns) in &privileges {
                if !resolver.check_grantable(&grantor, *kind, target.object, columns.as_ref()) {
                    return Err(AuthError::GrantorNotOwner {
                        grantor: grantor.clone(),
                        privilege: *kind,
                        object: target.name.clone(),
                    }
                    .into());
                }
            }
        }
        if let Some(view) = target.view {
            Self::check_view_grantable(&state.catalog, ctx, view)?;
        }

        // Apply
        let permissions = state.catalog.permissions_mut();
        for grantee in &grantees {
            for (kind, columns) in &privileges {
                let outcome = permissions.grant(
                    &grantor,
                    grantee,
                    *kind,
                    target.object,
                    columns.as_ref(),
                    stmt.with_grant_option,
                );
                info!(
                    grantor = %grantor,
                    grantee = %grantee,
                    privilege = %kind,
                    object = %target.name,
                    ?outcome,
                    "grant"
                );
            }
        }
        Ok(())
    }

    /// A view can be granted onward only while its definer could grant every
    /// privilege the view itself uses.
    fn check_view_grantable(
        catalog: &Catalog,
        ctx: &ExecContext<'_>,
        view: ObjectId,
    ) -> Result<(), ExecutorError> {
        let Some(definition) = catalog.view(view) else { return Ok(()) };
        let definer = catalog.owner_of(view).unwrap_or(catalog.dba());
        let compiled =
            compile_query(catalog, &TemporaryTables::default(), &definition.query, &definition.schema)?;
        let resolver = ctx.resolver(catalog);
        for requirement in &compiled.requirements {
            let implicit = matches!(
                resolver.check(definer, requirement.kind, requirement.target, requirement.columns.as_ref()),
                Access::Allowed(Authorization::BuiltIn | Authorization::SystemCatalog)
            );
            if !implicit && !resolver.check_grantable(definer, requirement.kind, requirement.target, requirement.columns.as_ref()) {
                let object = catalog
                    .object(requirement.target.object_id())
                    .map(|o| o.qualified_name())
                    .unwrap_or_default();
                return Err(AuthError::GrantorNotOwner {
                    grantor: definer.to_string(),
                    privilege: requirement.kind,
                    object,
                }
                .into());
            }
        }
        Ok(())
    }
}
