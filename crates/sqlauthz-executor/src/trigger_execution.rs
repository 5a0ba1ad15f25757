//! Trigger firing for DML operations
//!
//! Triggers are statement-level AFTER triggers. Actions run under the
//! trigger's definer; nesting is bounded by `execution.max_trigger_depth`.

use sqlauthz_ast::TriggerEvent;
use sqlauthz_catalog::{ObjectId, TriggerDefinition};
use sqlauthz_storage::DatabaseState;
use tracing::debug;

use crate::{
    context::FrameKind, errors::ExecutorError, exec_context::ExecContext,
    procedural::RoutineExecutor,
};

/// The DML operation that fired a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerAction {
    Insert,
    /// Positions of the updated columns
    Update(Vec<usize>),
    Delete,
}

impl TriggerAction {
    fn fires(&self, trigger: &TriggerDefinition) -> bool {
        match self {
            TriggerAction::Insert => matches!(trigger.event, TriggerEvent::Insert),
            TriggerAction::Update(columns) => trigger.fires_on_update(columns),
            TriggerAction::Delete => matches!(trigger.event, TriggerEvent::Delete),
        }
    }
}

pub struct TriggerExecutor;

impl TriggerExecutor {
    /// Fire every trigger on `table` matching `action`, in creation order.
    pub fn fire(
        state: &mut DatabaseState,
        ctx: &mut ExecContext<'_>,
        table: ObjectId,
        action: TriggerAction,
    ) -> Result<(), ExecutorError> {
        let triggers: Vec<TriggerDefinition> = state
            .catalog
            .triggers_on(table)
            .into_iter()
            .filter(|t| action.fires(t))
            .cloned()
            .collect();

        for trigger in triggers {
            let depth = ctx.config.execution.max_trigger_depth;
            if ctx.security.trigger_depth() >= depth {
                return Err(ExecutorError::TriggerDepthExceeded { depth });
            }
            let definer = state.catalog.owner_of(trigger.id).unwrap_or(state.catalog.dba()).to_string();
            debug!(trigger = %trigger.name, definer = %definer, ?action, "firing trigger");
            let role = state.catalog.compiled_role(trigger.id).map(str::to_string);
            ctx.as_definer(FrameKind::Trigger(trigger.id), &definer, role.as_deref(), |ctx| {
                for stmt in &trigger.actions {
                    RoutineExecutor::run_statement(state, ctx, stmt)?;
                }
                Ok(())
            })?;
        }
        Ok(())
    }
}
