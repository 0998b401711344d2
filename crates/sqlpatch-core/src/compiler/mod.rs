//! Patch compilation.
//!
//! A [`PatchCompiler`] turns an ordered list of [`Patch`]es into an ordered
//! list of statements. Two strategies ship with the crate:
//!
//! - [`DefaultCompiler`]: one statement per patch, in input order.
//! - [`BulkCompiler`]: merges runs of adjacent compatible patches into a
//!   single statement each, optionally capped by `max_patches`.
//!
//! Both accept an optional [`CompilerHook`] that sees every emitted
//! statement exactly once.
//!
//! # Example
//!
//! ```rust
//! use sqlpatch_core::builder::SqlValue;
//! use sqlpatch_core::compiler::{BulkCompiler, CompilerOptions, PatchCompiler};
//! use sqlpatch_core::dialect::GenericDialect;
//! use sqlpatch_core::Patch;
//!
//! let dialect = GenericDialect::new();
//! let patches = vec![
//!     Patch::insert("users", ["id"], vec![SqlValue::Int(1)]),
//!     Patch::insert("users", ["id"], vec![SqlValue::Int(2)]),
//! ];
//!
//! let stmts = BulkCompiler::new().compile(&CompilerOptions::new(&dialect, &patches));
//! assert_eq!(stmts.len(), 1);
//! ```

mod bulk;
mod default;
mod hook;

use std::fmt;

pub use bulk::BulkCompiler;
pub use default::DefaultCompiler;
pub use hook::CompilerHook;

use crate::builder::{ExprBuilder, Statement, StatementBuilder};
use crate::dialect::Dialect;
use crate::patch::{Patch, PatchKind};

/// Inputs of a single compilation.
#[derive(Clone, Copy)]
pub struct CompilerOptions<'a> {
    /// Dialect used for quoting and placeholders.
    pub dialect: &'a dyn Dialect,
    /// Patches in execution order.
    pub patches: &'a [Patch],
    /// Optional post-processing of each emitted statement.
    pub hook: Option<&'a dyn CompilerHook>,
}

impl<'a> CompilerOptions<'a> {
    /// Creates options without a hook.
    #[must_use]
    pub fn new(dialect: &'a dyn Dialect, patches: &'a [Patch]) -> Self {
        Self {
            dialect,
            patches,
            hook: None,
        }
    }

    /// Sets the compiler hook.
    #[must_use]
    pub fn hook(mut self, hook: &'a dyn CompilerHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub(crate) fn builder(&self) -> StatementBuilder<'a> {
        StatementBuilder::new(self.dialect)
    }
}

impl fmt::Debug for CompilerOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerOptions")
            .field("dialect", &self.dialect.name())
            .field("patches", &self.patches.len())
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// A strategy turning patches into statements.
///
/// Compilation never fails: structural errors in a patch panic, and
/// rendering errors surface later from [`Statement::build`].
///
/// # Panics
///
/// Implementations panic when a patch has a different number of columns
/// and values.
pub trait PatchCompiler: Send + Sync {
    /// Compiles `opts.patches` into statements, preserving their order.
    fn compile(&self, opts: &CompilerOptions<'_>) -> Vec<Box<dyn Statement>>;
}

impl<C: PatchCompiler + ?Sized> PatchCompiler for Box<C> {
    fn compile(&self, opts: &CompilerOptions<'_>) -> Vec<Box<dyn Statement>> {
        (**self).compile(opts)
    }
}

impl<C: PatchCompiler + ?Sized> PatchCompiler for std::sync::Arc<C> {
    fn compile(&self, opts: &CompilerOptions<'_>) -> Vec<Box<dyn Statement>> {
        (**self).compile(opts)
    }
}

/// Adapts a closure into a [`PatchCompiler`].
#[derive(Clone, Copy)]
pub struct CompilerFn<F>(pub F);

impl<F> CompilerFn<F>
where
    F: Fn(&CompilerOptions<'_>) -> Vec<Box<dyn Statement>> + Send + Sync,
{
    /// Wraps `f`.
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> PatchCompiler for CompilerFn<F>
where
    F: Fn(&CompilerOptions<'_>) -> Vec<Box<dyn Statement>> + Send + Sync,
{
    fn compile(&self, opts: &CompilerOptions<'_>) -> Vec<Box<dyn Statement>> {
        (self.0)(opts)
    }
}

impl<F> fmt::Debug for CompilerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CompilerFn")
    }
}

/// Compiles one patch into one statement, running it through the hook.
pub(crate) fn compile_single(opts: &CompilerOptions<'_>, patch: &Patch) -> Box<dyn Statement> {
    patch.assert_well_formed();
    let builder = opts.builder();

    match patch.kind {
        PatchKind::Insert => {
            let stmt = builder
                .insert(&patch.table_name, &patch.columns)
                .values(patch.values.clone());
            hook::finish_insert(opts.hook, stmt)
        }
        PatchKind::Update => {
            let stmt = builder
                .update(&patch.table_name, &patch.columns, &patch.values)
                .where_clause(predicate_of(opts.dialect, patch));
            hook::finish_update(opts.hook, stmt)
        }
        PatchKind::Delete => {
            let stmt = builder
                .delete(&patch.table_name)
                .where_clause(predicate_of(opts.dialect, patch));
            hook::finish_delete(opts.hook, stmt)
        }
    }
}

/// The row-key predicate of a patch; wildcards render `(1=1)`.
pub(crate) fn predicate_of(dialect: &dyn Dialect, patch: &Patch) -> ExprBuilder {
    patch
        .row_key
        .as_ref()
        .map_or_else(ExprBuilder::always_true, |key| key.to_predicate(dialect))
}
