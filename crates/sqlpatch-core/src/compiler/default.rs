//! One statement per patch.

use tracing::debug;

use super::{compile_single, CompilerOptions, PatchCompiler};
use crate::builder::Statement;

/// Compiles every patch into its own statement, in input order.
///
/// Updates and deletes always carry a WHERE clause; a patch without a row
/// key (or with an empty one) renders `WHERE (1=1)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCompiler;

impl DefaultCompiler {
    /// Creates the compiler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PatchCompiler for DefaultCompiler {
    fn compile(&self, opts: &CompilerOptions<'_>) -> Vec<Box<dyn Statement>> {
        let stmts: Vec<_> = opts
            .patches
            .iter()
            .map(|patch| compile_single(opts, patch))
            .collect();
        debug!(
            dialect = opts.dialect.name(),
            patches = opts.patches.len(),
            statements = stmts.len(),
            "compiled patches"
        );
        stmts
    }
}
