//! `RETURNING` clauses on compiled statements.

use sqlpatch_core::builder::{DeleteBuilder, InsertBuilder, Statement, UpdateBuilder};
use sqlpatch_core::compiler::CompilerHook;
use sqlpatch_core::dialect::Dialect;

use crate::SqliteDialect;

/// A compiler hook appending `RETURNING` to every statement, so that
/// executing the batch yields the affected rows (SQLite 3.35.0+).
#[derive(Debug, Clone, Default)]
pub struct ReturningHook {
    columns: Vec<String>,
}

impl ReturningHook {
    /// Returns every column (`RETURNING *`).
    #[must_use]
    pub const fn all() -> Self {
        Self { columns: Vec::new() }
    }

    /// Returns only the given columns.
    #[must_use]
    pub fn columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Renders the clause, e.g. ``RETURNING `id`,`name` ``.
    #[must_use]
    pub fn clause(&self) -> String {
        if self.columns.is_empty() {
            return String::from("RETURNING *");
        }
        let dialect = SqliteDialect::new();
        let quoted: Vec<String> = self.columns.iter().map(|c| dialect.quote(c)).collect();
        format!("RETURNING {}", quoted.join(","))
    }
}

impl CompilerHook for ReturningHook {
    fn post_insert(&self, stmt: InsertBuilder) -> Box<dyn Statement> {
        Box::new(stmt.suffix(self.clause()))
    }

    fn post_update(&self, stmt: UpdateBuilder) -> Box<dyn Statement> {
        Box::new(stmt.suffix(self.clause()))
    }

    fn post_delete(&self, stmt: DeleteBuilder) -> Box<dyn Statement> {
        Box::new(stmt.suffix(self.clause()))
    }
}
