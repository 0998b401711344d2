//! Post-processing of compiled statements.

use crate::builder::{DeleteBuilder, InsertBuilder, Statement, UpdateBuilder};

/// Post-processes each statement the compiler emits.
///
/// Every method is called exactly once per emitted statement, including
/// statements produced by merging several patches. A hook may return any
/// [`Statement`], not only the builder it was given.
pub trait CompilerHook: Send + Sync {
    /// Called for each INSERT.
    fn post_insert(&self, stmt: InsertBuilder) -> Box<dyn Statement> {
        Box::new(stmt)
    }

    /// Called for each UPDATE.
    fn post_update(&self, stmt: UpdateBuilder) -> Box<dyn Statement> {
        Box::new(stmt)
    }

    /// Called for each DELETE.
    fn post_delete(&self, stmt: DeleteBuilder) -> Box<dyn Statement> {
        Box::new(stmt)
    }
}

pub(super) fn finish_insert(
    hook: Option<&dyn CompilerHook>,
    stmt: InsertBuilder,
) -> Box<dyn Statement> {
    match hook {
        Some(hook) => hook.post_insert(stmt),
        None => Box::new(stmt),
    }
}

pub(super) fn finish_update(
    hook: Option<&dyn CompilerHook>,
    stmt: UpdateBuilder,
) -> Box<dyn Statement> {
    match hook {
        Some(hook) => hook.post_update(stmt),
        None => Box::new(stmt),
    }
}

pub(super) fn finish_delete(
    hook: Option<&dyn CompilerHook>,
    stmt: DeleteBuilder,
) -> Box<dyn Statement> {
    match hook {
        Some(hook) => hook.post_delete(stmt),
        None => Box::new(stmt),
    }
}
