use sqlauthz_ast::RoutineKind;
use sqlauthz_catalog::{Catalog, ObjectId};

use crate::{
    config::EngineConfig, context::FrameKind, errors::ExecutorError, exec_context::ExecContext,
    temporary::TemporaryTables,
};

fn nest(ctx: &mut ExecContext<'_>, remaining: usize) -> Result<usize, ExecutorError> {
    if remaining == 0 {
        return Ok(ctx.security.frames().len());
    }
    ctx.as_definer(FrameKind::View(ObjectId(remaining as u64)), "M1", None, |ctx| nest(ctx, remaining - 1))
}

#[test]
fn test_nesting_limit_is_enforced() {
    let mut config = EngineConfig::default();
    config.execution.max_nesting_depth = 4;
    let mut ctx = ExecContext::new(&config, "U1", "U1", TemporaryTables::default());

    assert_eq!(nest(&mut ctx, 4).unwrap(), 5);
    let err = nest(&mut ctx, 5).unwrap_err();
    assert_eq!(err.sql_state(), "54001");
    assert_eq!(ctx.principal(), "U1");
    assert_eq!(ctx.security.frames().len(), 1);
}

#[test]
fn test_invoker_frame_keeps_session_user_under_definer() {
    let mut catalog = Catalog::new("DBA");
    catalog.create_schema("M1", "M1").unwrap();
    let procedure = catalog.create_routine("M1", "P", RoutineKind::Procedure, vec![]).unwrap();

    let config = EngineConfig::default();
    let mut ctx = ExecContext::new(&config, "U2", "U2", TemporaryTables::default());

    ctx.as_definer(FrameKind::Trigger(ObjectId(7)), "M1", None, |ctx| {
        assert_eq!(ctx.principal(), "M1");
        assert_eq!(ctx.security.trigger_depth(), 1);
        ctx.as_invoker(procedure, |ctx| {
            assert_eq!(ctx.principal(), "U2");
            Ok(())
        })
    })
    .unwrap();
    assert_eq!(ctx.principal(), "U2");
    assert_eq!(ctx.security.trigger_depth(), 0);
}
