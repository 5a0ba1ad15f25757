//! REVOKE statement executor
//!
//! `Validate → Authorize → Apply → Cascade → Report`. Every dependent bound to
//! a removed or narrowed record is dropped and reported as a warning. The
//! statement runs on a scratch copy of the state, so an error (including the
//! RESTRICT check on EXECUTE) leaves nothing behind.

use std::collections::BTreeSet;

use sqlauthz_ast::RevokeStmt;
use sqlauthz_catalog::{
    Catalog, ColumnBitset, ObjectRef, PermissionRecord, PermissionRecordId, Principal,
    PrivilegeKind, Provider, RevokeOutcome,
};
use sqlauthz_storage::DatabaseState;
use tracing::{debug, info};

use crate::{
    errors::{AuthError, ExecutorError},
    exec_context::ExecContext,
    grant::{check_grantees, GrantTarget},
    result::Warning,
};

/// Executor for REVOKE statements
pub struct RevokeExecutor;

impl RevokeExecutor {
    pub fn execute_revoke(
        state: &mut DatabaseState,
        ctx: &ExecContext<'_>,
        stmt: &RevokeStmt,
    ) -> Result<Vec<Warning>, ExecutorError> {
        // Validate
        let target = GrantTarget::resolve(&state.catalog, ctx, stmt.object_type, &stmt.objects)?;
        let privileges = target.privileges(&stmt.privileges)?;
        let routine = matches!(target.object, ObjectRef::Routine { .. });
        if routine && !stmt.restrict {
            return Err(ExecutorError::InvalidStatement("REVOKE EXECUTE requires RESTRICT".to_string()));
        }
        if !routine && stmt.restrict {
            return Err(ExecutorError::InvalidStatement(
                "RESTRICT is only allowed when revoking EXECUTE".to_string(),
            ));
        }
        let revoker = ctx.principal();
        let grantees = check_grantees(&state.catalog, &revoker, &target, &stmt.grantees)?;

        // Authorize
        let admin = !ctx.config.security.sql_authorization
            || revoker == target.owner
            || revoker == state.catalog.dba();
        if !admin {
            let resolver = ctx.resolver(&state.catalog);
            for (kind, columns) in &privileges {
                if !resolver.check_grantable(&revoker, *kind, target.object, columns.as_ref()) {
                    return Err(AuthError::GrantorNotOwner {
                        grantor: revoker.clone(),
                        privilege: *kind,
                        object: target.name.clone(),
                    }
                    .into());
                }
            }
        }
        let grantor_filter = if admin { None } else { Some(revoker.as_str()) };

        // Apply
        let mut warnings = Vec::new();
        let mut outcome = RevokeOutcome::default();
        for grantee in &grantees {
            for (kind, columns) in &privileges {
                let removed = state.catalog.permissions_mut().revoke(
                    grantee,
                    *kind,
                    target.object,
                    columns.as_ref(),
                    grantor_filter,
                );
                if removed.is_empty() {
                    warnings.push(Warning::privilege_not_revoked(kind.name(), &grantee.to_string(), &target.name));
                }
                info!(
                    revoker = %revoker,
                    grantee = %grantee,
                    privilege = %kind,
                    object = %target.name,
                    removed = removed.removed.len(),
                    narrowed = removed.narrowed.len(),
                    "revoke"
                );
                outcome.merge(removed);
            }
        }
        let kinds: BTreeSet<PrivilegeKind> = privileges.iter().map(|(k, _)| *k).collect();
        outcome.merge(remove_abandoned(&mut state.catalog, ctx, target.object, &kinds));
        let affected = outcome.affected();

        if routine {
            Self::check_restrict(&state.catalog, &target.name, &affected)?;
        }

        // Cascade
        for record in affected {
            for dropped in state.catalog.invalidate_record(record) {
                warnings.push(Warning::dropped(&dropped));
            }
            if state.catalog.permissions().get(record).is_none() {
                state.catalog.dependencies_mut().forget_permission(record);
            }
        }
        Ok(warnings)
    }

    fn check_restrict(
        catalog: &Catalog,
        object: &str,
        affected: &[PermissionRecordId],
    ) -> Result<(), ExecutorError> {
        let blocker = affected
            .iter()
            .flat_map(|r| catalog.dependencies().dependents_of(Provider::Permission(*r)))
            .find_map(|d| catalog.object(d.id));
        match blocker {
            Some(dependent) => Err(AuthError::DependentsExist {
                operation: "REVOKE EXECUTE".to_string(),
                object: object.to_string(),
                dependent_kind: dependent.kind_name(),
                dependent: dependent.qualified_name(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

/// Grant authority a principal derives from supported WITH GRANT OPTION
/// records.
#[derive(Debug, Clone, PartialEq)]
enum Authority {
    None,
    All,
    Columns(ColumnBitset),
}

impl Authority {
    fn covers(&self, columns: Option<&ColumnBitset>) -> bool {
        match (self, columns) {
            (Authority::All, _) => true,
            (Authority::Columns(held), Some(requested)) => held.covers(requested),
            _ => false,
        }
    }

    fn add(&mut self, record: &PermissionRecord) {
        *self = match (&*self, &record.columns) {
            (Authority::All, _) | (_, None) => Authority::All,
            (Authority::None, Some(columns)) => Authority::Columns(columns.clone()),
            (Authority::Columns(held), Some(columns)) => Authority::Columns(held.union(columns)),
        };
    }
}

fn authority_of(records: &[PermissionRecord], supported: &BTreeSet<PermissionRecordId>, grantor: &str) -> Authority {
    let mut authority = Authority::None;
    for record in records {
        let holder = record.grantee.is_user(grantor) || record.grantee == Principal::Public;
        if holder && record.with_grant_option && supported.contains(&record.id) {
            authority.add(record);
        }
    }
    authority
}

/// Remove or narrow records on `target` whose grantor no longer has grant
/// authority for them. Authority flows from the owner and the DBA through
/// WITH GRANT OPTION records; records only supported by a cycle of grants
/// among non-owners are abandoned too.
fn remove_abandoned(
    catalog: &mut Catalog,
    ctx: &ExecContext<'_>,
    target: ObjectRef,
    kinds: &BTreeSet<PrivilegeKind>,
) -> RevokeOutcome {
    let mut outcome = RevokeOutcome::default();
    if !ctx.config.security.sql_authorization {
        return outcome;
    }
    let owner = catalog.owner_of(target.object_id()).unwrap_or_default().to_string();
    let dba = catalog.dba().to_string();

    for kind in kinds {
        loop {
            let records: Vec<PermissionRecord> = catalog
                .permissions()
                .records()
                .filter(|r| r.target == target && r.kind == *kind)
                .cloned()
                .collect();

            let mut supported: BTreeSet<PermissionRecordId> = records
                .iter()
                .filter(|r| r.grantor == owner || r.grantor == dba)
                .map(|r| r.id)
                .collect();
            loop {
                let newly: Vec<PermissionRecordId> = records
                    .iter()
                    .filter(|r| !supported.contains(&r.id))
                    .filter(|r| authority_of(&records, &supported, &r.grantor).covers(r.columns.as_ref()))
                    .map(|r| r.id)
                    .collect();
                if newly.is_empty() {
                    break;
                }
                supported.extend(newly);
            }

            let mut round = RevokeOutcome::default();
            for record in records.iter().filter(|r| !supported.contains(&r.id)) {
                let authority = authority_of(&records, &supported, &record.grantor);
                let keep = match (&authority, &record.columns) {
                    (Authority::Columns(held), Some(granted)) if held.intersects(granted) => {
                        Some(granted.intersection(held))
                    }
                    _ => None,
                };
                let permissions = catalog.permissions_mut();
                match keep {
                    Some(columns) => {
                        if permissions.narrow(record.id, columns) {
                            round.narrowed.push(record.id);
                        }
                    }
                    None => {
                        if let Some(r) = permissions.remove(record.id) {
                            round.removed.push(r);
                        }
                    }
                }
                debug!(record = %record.id, grantor = %record.grantor, "abandoned grant");
            }
            if round.is_empty() {
                break;
            }
            outcome.merge(round);
        }
    }
    outcome
}
