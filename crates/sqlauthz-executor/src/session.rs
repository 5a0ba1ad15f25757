//! Engine and sessions
//!
//! Outside a transaction every write statement runs on a private copy of the
//! latest committed state and is published only if it succeeds. Inside a
//! transaction statements run on a scratch copy of the transaction's state,
//! which replaces it only on success. Either way a failed statement changes
//! nothing.
//!
//! A transaction remembers the statements that changed its state. If another
//! session commits first and the two touched different things, COMMIT runs
//! those statements again on the newer state instead of failing.

use std::sync::Arc;

use sqlauthz_ast::{Query, RoutineKind, Statement};
use sqlauthz_catalog::{normalize_identifier, Catalog, CatalogError, SYSTEM_FUNCTION_SCHEMA};
use sqlauthz_storage::{Database, DatabaseState, TransactionManager};
use tracing::{debug, info, warn};

use crate::{
    alter::AlterTableExecutor,
    config::EngineConfig,
    create_table::CreateTableExecutor,
    cursor::Cursor,
    delete::DeleteExecutor,
    drop::DropExecutor,
    errors::{AuthError, ExecutorError},
    exec_context::ExecContext,
    grant::GrantExecutor,
    insert::InsertExecutor,
    procedural::RoutineExecutor,
    result::{Outcome, ResultSet, StatementResult},
    revoke::RevokeExecutor,
    role_ddl::RoleExecutor,
    routine_ddl::{RoutineDdlExecutor, SynonymExecutor},
    schema_ddl::SchemaExecutor,
    select::SelectExecutor,
    temporary::TemporaryTables,
    trigger_ddl::TriggerDdlExecutor,
    update::UpdateExecutor,
    view_ddl::ViewExecutor,
};

/// One database plus the configuration its sessions run with.
#[derive(Debug, Clone)]
pub struct Engine {
    database: Arc<Database>,
    config: Arc<EngineConfig>,
}

impl Engine {
    /// Create an empty database owned by the configured DBA, with the
    /// configured built-in functions installed in `SYSFUN`.
    pub fn new(config: EngineConfig) -> Self {
        let dba = normalize_identifier(&config.security.database_owner);
        let mut catalog = Catalog::new(&dba);
        for name in &config.security.builtin_functions {
            catalog.insert_system_routine(
                SYSTEM_FUNCTION_SCHEMA,
                &normalize_identifier(name),
                RoutineKind::Function,
            );
        }
        info!(dba = %dba, sql_authorization = config.security.sql_authorization, "engine started");
        Engine { database: Arc::new(Database::new(catalog)), config: Arc::new(config) }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.database
    }

    /// Open a session for `user`. Unqualified names resolve in the schema
    /// named after the user.
    pub fn connect(&self, user: &str) -> Session {
        let user = normalize_identifier(user);
        debug!(user = %user, "session opened");
        Session {
            default_schema: user.clone(),
            user,
            role: None,
            database: Arc::clone(&self.database),
            config: Arc::clone(&self.config),
            transactions: TransactionManager::new(),
            temp: TemporaryTables::default(),
            temp_at_begin: None,
            journal: Vec::new(),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// A write statement run inside the current transaction, with the settings
/// it ran under.
#[derive(Debug, Clone)]
struct JournalEntry {
    statement: Statement,
    default_schema: String,
    role: Option<String>,
}

/// A connection executing statements as one user.
#[derive(Debug)]
pub struct Session {
    user: String,
    default_schema: String,
    /// Set by SET ROLE
    role: Option<String>,
    database: Arc<Database>,
    config: Arc<EngineConfig>,
    transactions: TransactionManager,
    temp: TemporaryTables,
    /// Temporary tables as they were at BEGIN, restored on rollback
    temp_at_begin: Option<TemporaryTables>,
    journal: Vec<JournalEntry>,
}

impl Session {
    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn default_schema(&self) -> &str {
        &self.default_schema
    }

    /// SET SCHEMA. The schema is not required to exist yet.
    pub fn set_schema(&mut self, schema: &str) {
        self.default_schema = normalize_identifier(schema);
    }

    /// The current role, unless it has been revoked from the user or
    /// dropped since it was set.
    pub fn current_role(&self) -> Option<&str> {
        let role = self.role.as_deref()?;
        let settable = match self.transactions.working() {
            Some(working) => working.catalog.role_settable(role, &self.user),
            None => self.database.snapshot().catalog.role_settable(role, &self.user),
        };
        settable.then_some(role)
    }

    /// SET ROLE. `None` (SET ROLE NONE) clears the current role.
    pub fn set_role(&mut self, role: Option<&str>) -> Result<(), ExecutorError> {
        let Some(role) = role else {
            debug!(user = %self.user, "role cleared");
            self.role = None;
            return Ok(());
        };
        let name = normalize_identifier(role);
        let snapshot;
        let catalog = match self.transactions.working() {
            Some(working) => &working.catalog,
            None => {
                snapshot = self.database.snapshot();
                &snapshot.catalog
            }
        };
        if catalog.role(&name).is_none() {
            return Err(CatalogError::RoleNotFound(name).into());
        }
        if self.config.security.sql_authorization && !catalog.role_settable(&name, &self.user) {
            return Err(AuthError::RoleNotGranted { role: name, user: self.user.clone() }.into());
        }
        debug!(user = %self.user, role = %name, "role set");
        self.role = Some(name);
        Ok(())
    }

    pub fn in_transaction(&self) -> bool {
        self.transactions.in_transaction()
    }

    pub fn execute(&mut self, stmt: &Statement) -> Result<StatementResult, ExecutorError> {
        debug!(user = %self.user, statement = statement_kind(stmt), "executing statement");
        let result = match stmt {
            Statement::BeginTransaction => self.begin().map(|_| StatementResult::done()),
            Statement::Commit => self.commit().map(|_| StatementResult::done()),
            Statement::Rollback => self.rollback().map(|_| StatementResult::done()),
            Statement::SetRole(set) => self.set_role(set.role.as_deref()).map(|_| StatementResult::done()),
            Statement::Select(query) => self.query(query).map(StatementResult::rows),
            _ => self.execute_write(stmt),
        };
        match &result {
            Ok(done) => {
                for warning in &done.warnings {
                    info!(user = %self.user, sql_state = warning.sql_state(), "{}", warning.message);
                }
            }
            Err(err) => {
                warn!(user = %self.user, statement = statement_kind(stmt), sql_state = err.sql_state(), error = %err, "statement failed");
            }
        }
        result
    }

    /// Run `query` and capture its rows together with the state they came from.
    pub fn open_cursor(&self, query: &Query) -> Result<Cursor, ExecutorError> {
        let snapshot = match self.transactions.working() {
            Some(working) => Arc::new(working.clone()),
            None => self.database.snapshot(),
        };
        let rows = self.select_on(&snapshot, query)?;
        Ok(Cursor::new(snapshot, rows))
    }

    pub fn begin(&mut self) -> Result<(), ExecutorError> {
        self.transactions.begin_transaction(self.database.snapshot())?;
        self.temp_at_begin = Some(self.temp.clone());
        self.journal.clear();
        Ok(())
    }

    /// Publish the transaction. A serialization failure discards it, as a
    /// rollback would.
    pub fn commit(&mut self) -> Result<(), ExecutorError> {
        let journal = std::mem::take(&mut self.journal);
        let temp_at_begin = self.temp_at_begin.take();
        let mut replayed_temp = None;
        let (config, user) = (&self.config, &self.user);
        let replay = |state: &mut DatabaseState| -> Result<(), ExecutorError> {
            let mut temp = temp_at_begin.clone().unwrap_or_default();
            for entry in &journal {
                let mut ctx =
                    ExecContext::new(config, user, &entry.default_schema, temp).with_role(entry.role.as_deref());
                apply(state, &mut ctx, &entry.statement)?;
                temp = ctx.temp;
            }
            replayed_temp = Some(temp);
            Ok(())
        };
        match self.transactions.commit_transaction(&self.database, replay) {
            Ok(()) => {
                if let Some(temp) = replayed_temp {
                    self.temp = temp;
                }
                info!(user = %self.user, statements = journal.len(), "transaction committed");
                Ok(())
            }
            Err(err) => {
                if let Some(temp) = temp_at_begin {
                    self.temp = temp;
                }
                Err(err)
            }
        }
    }

    pub fn rollback(&mut self) -> Result<(), ExecutorError> {
        self.transactions.rollback_transaction()?;
        self.journal.clear();
        if let Some(temp) = self.temp_at_begin.take() {
            self.temp = temp;
        }
        info!(user = %self.user, "transaction rolled back");
        Ok(())
    }

    fn query(&self, query: &Query) -> Result<ResultSet, ExecutorError> {
        match self.transactions.working() {
            Some(working) => self.select_on(working, query),
            None => self.select_on(&self.database.snapshot(), query),
        }
    }

    fn select_on(&self, state: &DatabaseState, query: &Query) -> Result<ResultSet, ExecutorError> {
        let mut ctx = ExecContext::new(&self.config, &self.user, &self.default_schema, self.temp.clone())
            .with_role(self.role.as_deref());
        SelectExecutor::execute(state, &mut ctx, query)
    }

    fn execute_write(&mut self, stmt: &Statement) -> Result<StatementResult, ExecutorError> {
        let mut ctx = ExecContext::new(&self.config, &self.user, &self.default_schema, self.temp.clone())
            .with_role(self.role.as_deref());
        let outcome = match self.transactions.working() {
            Some(working) => {
                let mut scratch = working.clone();
                let outcome = apply(&mut scratch, &mut ctx, stmt)?;
                self.transactions.install(scratch)?;
                self.journal.push(JournalEntry {
                    statement: stmt.clone(),
                    default_schema: self.default_schema.clone(),
                    role: self.role.clone(),
                });
                outcome
            }
            None => self.database.write(|state| apply(state, &mut ctx, stmt))?,
        };
        self.temp = ctx.temp;
        Ok(StatementResult { outcome, warnings: ctx.warnings })
    }
}

/// Dispatch one statement to its executor.
fn apply(
    state: &mut DatabaseState,
    ctx: &mut ExecContext<'_>,
    stmt: &Statement,
) -> Result<Outcome, ExecutorError> {
    match stmt {
        Statement::Select(query) => SelectExecutor::execute(state, ctx, query).map(Outcome::Rows),
        Statement::Insert(insert) => InsertExecutor::execute(state, ctx, insert).map(Outcome::RowCount),
        Statement::Update(update) => UpdateExecutor::execute(state, ctx, update).map(Outcome::RowCount),
        Statement::Delete(delete) => DeleteExecutor::execute(state, ctx, delete).map(Outcome::RowCount),
        Statement::Call(call) => RoutineExecutor::execute_call(state, ctx, call).map(|_| Outcome::Done),
        Statement::CreateSchema(create) => {
            SchemaExecutor::execute_create_schema(state, ctx, create).map(|_| Outcome::Done)
        }
        Statement::CreateTable(create) => CreateTableExecutor::execute(state, ctx, create).map(|_| Outcome::Done),
        Statement::AlterTable(alter) => AlterTableExecutor::execute(state, ctx, alter).map(|_| Outcome::Done),
        Statement::CreateView(create) => {
            ViewExecutor::execute_create_view(state, ctx, create).map(|_| Outcome::Done)
        }
        Statement::CreateTrigger(create) => {
            TriggerDdlExecutor::execute_create_trigger(state, ctx, create).map(|_| Outcome::Done)
        }
        Statement::CreateRoutine(create) => {
            RoutineDdlExecutor::execute_create_routine(state, ctx, create).map(|_| Outcome::Done)
        }
        Statement::CreateSynonym(create) => {
            SynonymExecutor::execute_create_synonym(state, ctx, create).map(|_| Outcome::Done)
        }
        Statement::Drop(drop) => DropExecutor::execute(state, ctx, drop).map(|_| Outcome::Done),
        Statement::Grant(grant) => GrantExecutor::execute_grant(state, ctx, grant).map(|_| Outcome::Done),
        Statement::Revoke(revoke) => {
            let warnings = RevokeExecutor::execute_revoke(state, ctx, revoke)?;
            ctx.warnings.extend(warnings);
            Ok(Outcome::Done)
        }
        Statement::CreateRole(create) => {
            RoleExecutor::execute_create_role(state, ctx, create).map(|_| Outcome::Done)
        }
        Statement::DropRole(drop) => {
            let warnings = RoleExecutor::execute_drop_role(state, ctx, drop)?;
            ctx.warnings.extend(warnings);
            Ok(Outcome::Done)
        }
        Statement::GrantRole(grant) => {
            RoleExecutor::execute_grant_role(state, ctx, grant).map(|_| Outcome::Done)
        }
        Statement::RevokeRole(revoke) => {
            let warnings = RoleExecutor::execute_revoke_role(state, ctx, revoke)?;
            ctx.warnings.extend(warnings);
            Ok(Outcome::Done)
        }
        Statement::SetRole(_) | Statement::BeginTransaction | Statement::Commit | Statement::Rollback => {
            Err(ExecutorError::InvalidStatement(
                "SET ROLE and transaction control are handled by the session".to_string(),
            ))
        }
    }
}

fn statement_kind(stmt: &Statement) -> &'static str {
    match stmt {
        Statement::Select(_) => "SELECT",
        Statement::Insert(_) => "INSERT",
        Statement::Update(_) => "UPDATE",
        Statement::Delete(_) => "DELETE",
        Statement::Call(_) => "CALL",
        Statement::CreateSchema(_) => "CREATE SCHEMA",
        Statement::CreateTable(_) => "CREATE TABLE",
        Statement::AlterTable(_) => "ALTER TABLE",
        Statement::CreateView(_) => "CREATE VIEW",
        Statement::CreateTrigger(_) => "CREATE TRIGGER",
        Statement::CreateRoutine(_) => "CREATE ROUTINE",
        Statement::CreateSynonym(_) => "CREATE SYNONYM",
        Statement::Drop(_) => "DROP",
        Statement::Grant(_) => "GRANT",
        Statement::Revoke(_) => "REVOKE",
        Statement::CreateRole(_) => "CREATE ROLE",
        Statement::DropRole(_) => "DROP ROLE",
        Statement::GrantRole(_) => "GRANT ROLE",
        Statement::RevokeRole(_) => "REVOKE ROLE",
        Statement::SetRole(_) => "SET ROLE",
        Statement::BeginTransaction => "BEGIN",
        Statement::Commit => "COMMIT",
        Statement::Rollback => "ROLLBACK",
    }
}
