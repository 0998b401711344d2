//! SQLite UPSERT (INSERT ... ON CONFLICT) as a compiler hook.

use sqlpatch_core::builder::{InsertBuilder, Statement};
use sqlpatch_core::compiler::CompilerHook;
use sqlpatch_core::dialect::Dialect;

use crate::SqliteDialect;

/// What to do with a row that violates the conflict target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictAction {
    /// `DO NOTHING`.
    Nothing,
    /// `DO UPDATE SET` every inserted column outside the conflict target.
    UpdateAll,
    /// `DO UPDATE SET` the given columns.
    Update(Vec<String>),
}

/// Turns every compiled INSERT into an UPSERT (SQLite 3.24.0+).
///
/// Updates and deletes pass through unchanged. Merged multi-row inserts
/// keep a single `ON CONFLICT` clause, which SQLite applies per row.
///
/// # Example
///
/// ```rust
/// use sqlpatch_core::builder::SqlValue;
/// use sqlpatch_core::compiler::{CompilerOptions, DefaultCompiler, PatchCompiler};
/// use sqlpatch_core::Patch;
/// use sqlpatch_sqlite::{SqliteDialect, UpsertHook};
///
/// let dialect = SqliteDialect::new();
/// let hook = UpsertHook::on_conflict(["id"]).do_update_all();
/// let patches = vec![Patch::insert(
///     "users",
///     ["id", "name"],
///     vec![SqlValue::Int(1), SqlValue::Text("Alice".into())],
/// )];
///
/// let opts = CompilerOptions::new(&dialect, &patches).hook(&hook);
/// let stmts = DefaultCompiler::new().compile(&opts);
/// let (sql, _) = stmts[0].build().unwrap();
/// assert_eq!(
///     sql,
///     "INSERT INTO `users` (`id`,`name`) VALUES (?,?) \
///      ON CONFLICT (`id`) DO UPDATE SET `name` = excluded.`name`"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct UpsertHook {
    conflict_columns: Vec<String>,
    action: ConflictAction,
}

impl UpsertHook {
    /// Targets the given unique or primary key columns. Defaults to
    /// `DO NOTHING`.
    #[must_use]
    pub fn on_conflict<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            conflict_columns: columns.into_iter().map(Into::into).collect(),
            action: ConflictAction::Nothing,
        }
    }

    /// Sets DO NOTHING action.
    #[must_use]
    pub fn do_nothing(mut self) -> Self {
        self.action = ConflictAction::Nothing;
        self
    }

    /// Sets DO UPDATE for every non-conflict column of the insert.
    #[must_use]
    pub fn do_update_all(mut self) -> Self {
        self.action = ConflictAction::UpdateAll;
        self
    }

    /// Sets DO UPDATE with specified columns.
    #[must_use]
    pub fn do_update<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.action = ConflictAction::Update(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Returns the configured action.
    #[must_use]
    pub const fn action(&self) -> &ConflictAction {
        &self.action
    }

    /// Renders the `ON CONFLICT` clause for an insert of `inserted`
    /// (already quoted) columns.
    fn clause(&self, inserted: &[String]) -> String {
        let dialect = SqliteDialect::new();
        let target: Vec<String> = self
            .conflict_columns
            .iter()
            .map(|c| dialect.quote(c))
            .collect();

        let updates: Vec<String> = match &self.action {
            ConflictAction::Nothing => vec![],
            ConflictAction::UpdateAll => inserted
                .iter()
                .filter(|c| !target.contains(c))
                .cloned()
                .collect(),
            ConflictAction::Update(columns) => columns.iter().map(|c| dialect.quote(c)).collect(),
        };

        let mut sql = format!("ON CONFLICT ({})", target.join(","));
        if updates.is_empty() {
            sql.push_str(" DO NOTHING");
        } else {
            sql.push_str(" DO UPDATE SET ");
            let sets: Vec<String> = updates
                .iter()
                .map(|col| format!("{col} = excluded.{col}"))
                .collect();
            sql.push_str(&sets.join(", "));
        }
        sql
    }
}

impl CompilerHook for UpsertHook {
    fn post_insert(&self, stmt: InsertBuilder) -> Box<dyn Statement> {
        let clause = self.clause(stmt.column_names());
        Box::new(stmt.suffix(clause))
    }
}
