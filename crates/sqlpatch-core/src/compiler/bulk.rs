//! Merging of adjacent compatible patches.

use tracing::{debug, trace};

use super::{compile_single, hook, CompilerOptions, PatchCompiler};
use crate::builder::{ExprBuilder, Statement};
use crate::patch::{Patch, PatchKind};

/// Merges runs of adjacent compatible patches into one statement each.
///
/// Two adjacent patches are compatible when they have the same kind and
/// table and:
///
/// - inserts: the same columns, in the same order, become one multi-row
///   `INSERT ... VALUES (...),(...)`;
/// - updates: the same columns and equal values become one `UPDATE` whose
///   WHERE clause ORs the row-key predicates together;
/// - deletes: always, becoming one `DELETE` with an OR-ed WHERE clause.
///
/// Any wildcard row key in an update or delete run turns the whole
/// predicate into `(1=1)`. A run of one patch renders exactly as
/// [`DefaultCompiler`](super::DefaultCompiler) would render it.
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkCompiler {
    max_patches: usize,
}

impl BulkCompiler {
    /// Creates a compiler with unbounded runs.
    #[must_use]
    pub const fn new() -> Self {
        Self { max_patches: 0 }
    }

    /// Caps the number of patches merged into a single statement.
    ///
    /// `0` means unbounded.
    #[must_use]
    pub const fn max_patches(mut self, max_patches: usize) -> Self {
        self.max_patches = max_patches;
        self
    }

    fn is_full(&self, run: &[&Patch]) -> bool {
        self.max_patches > 0 && run.len() >= self.max_patches
    }
}

fn compatible(head: &Patch, patch: &Patch) -> bool {
    if head.kind != patch.kind || head.table_name != patch.table_name {
        return false;
    }
    match patch.kind {
        PatchKind::Insert => head.columns == patch.columns,
        PatchKind::Update => head.columns == patch.columns && head.values == patch.values,
        PatchKind::Delete => true,
    }
}

/// ORs the row-key predicates of a run; a wildcard anywhere wins.
fn disjunction_of(opts: &CompilerOptions<'_>, run: &[&Patch]) -> ExprBuilder {
    if run.iter().any(|patch| patch.is_wildcard()) {
        return ExprBuilder::always_true();
    }
    let predicates = run.iter().filter_map(|patch| patch.row_key.as_ref()).map(|key| {
        let predicate = key.to_predicate(opts.dialect);
        if key.len() > 1 {
            predicate.paren()
        } else {
            predicate
        }
    });
    ExprBuilder::disjunction(predicates).unwrap_or_else(ExprBuilder::always_true)
}

fn compile_run(opts: &CompilerOptions<'_>, run: &[&Patch]) -> Option<Box<dyn Statement>> {
    let (head, rest) = run.split_first()?;
    if rest.is_empty() {
        return Some(compile_single(opts, head));
    }
    trace!(kind = %head.kind, table = %head.table_name, patches = run.len(), "merging patches");

    let builder = opts.builder();
    let stmt = match head.kind {
        PatchKind::Insert => {
            let mut stmt = builder.insert(&head.table_name, &head.columns);
            for patch in run {
                stmt.push_values(patch.values.clone());
            }
            hook::finish_insert(opts.hook, stmt)
        }
        PatchKind::Update => {
            let stmt = builder
                .update(&head.table_name, &head.columns, &head.values)
                .where_clause(disjunction_of(opts, run));
            hook::finish_update(opts.hook, stmt)
        }
        PatchKind::Delete => {
            let stmt = builder
                .delete(&head.table_name)
                .where_clause(disjunction_of(opts, run));
            hook::finish_delete(opts.hook, stmt)
        }
    };
    Some(stmt)
}

impl PatchCompiler for BulkCompiler {
    fn compile(&self, opts: &CompilerOptions<'_>) -> Vec<Box<dyn Statement>> {
        let mut stmts = vec![];
        let mut run: Vec<&Patch> = vec![];

        for patch in opts.patches {
            patch.assert_well_formed();
            let breaks = run
                .first()
                .is_some_and(|head| self.is_full(&run) || !compatible(head, patch));
            if breaks {
                stmts.extend(compile_run(opts, &run));
                run.clear();
            }
            run.push(patch);
        }
        stmts.extend(compile_run(opts, &run));

        debug!(
            dialect = opts.dialect.name(),
            patches = opts.patches.len(),
            statements = stmts.len(),
            max_patches = self.max_patches,
            "compiled patches in bulk"
        );
        stmts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SqlValue;
    use crate::dialect::GenericDialect;
    use crate::row_key::RowKey;

    fn insert(id: i64) -> Patch {
        Patch::insert("t", ["id"], vec![SqlValue::Int(id)])
    }

    fn compile(compiler: BulkCompiler, patches: &[Patch]) -> Vec<(String, Vec<SqlValue>)> {
        let dialect = GenericDialect::new();
        compiler
            .compile(&CompilerOptions::new(&dialect, patches))
            .iter()
            .map(|stmt| stmt.build().unwrap())
            .collect()
    }

    #[test]
    fn test_single_patch_matches_default() {
        let key = RowKey::new("t").with("a", 1_i64).with("b", 2_i64);
        let patches = vec![Patch::delete("t", Some(key))];
        let out = compile(BulkCompiler::new(), &patches);
        assert_eq!(out[0].0, "DELETE FROM \"t\" WHERE \"a\" = ? AND \"b\" = ?");
    }

    #[test]
    fn test_kind_change_breaks_run() {
        let patches = vec![insert(1), Patch::delete("t", None), insert(2)];
        let out = compile(BulkCompiler::new(), &patches);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_table_change_breaks_run() {
        let patches = vec![
            insert(1),
            Patch::insert("u", ["id"], vec![SqlValue::Int(2)]),
        ];
        let out = compile(BulkCompiler::new(), &patches);
        assert_eq!(out[0].0, "INSERT INTO \"t\" (\"id\") VALUES (?)");
        assert_eq!(out[1].0, "INSERT INTO \"u\" (\"id\") VALUES (?)");
    }

    #[test]
    fn test_max_patches_caps_runs() {
        let patches: Vec<Patch> = (1..=5).map(insert).collect();
        let out = compile(BulkCompiler::new().max_patches(2), &patches);
        let sizes: Vec<usize> = out.iter().map(|(_, params)| params.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_update_run_requires_equal_values() {
        let key = |id: i64| Some(RowKey::new("t").with("id", id));
        let patches = vec![
            Patch::update("t", key(1), ["flag"], vec![SqlValue::Bool(true)]),
            Patch::update("t", key(2), ["flag"], vec![SqlValue::Bool(true)]),
            Patch::update("t", key(3), ["flag"], vec![SqlValue::Bool(false)]),
        ];
        let out = compile(BulkCompiler::new(), &patches);

        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0].0,
            "UPDATE \"t\" SET \"flag\" = ? WHERE (\"id\" = ? OR \"id\" = ?)"
        );
        assert_eq!(
            out[0].1,
            vec![SqlValue::Bool(true), SqlValue::Int(1), SqlValue::Int(2)]
        );
        assert_eq!(out[1].0, "UPDATE \"t\" SET \"flag\" = ? WHERE \"id\" = ?");
    }

    #[test]
    fn test_delete_run_parenthesises_composite_keys() {
        let patches = vec![
            Patch::delete("t", Some(RowKey::new("t").with("a", 1_i64).with("b", 2_i64))),
            Patch::delete("t", Some(RowKey::new("t").with("a", 3_i64))),
        ];
        let out = compile(BulkCompiler::new(), &patches);
        assert_eq!(
            out[0].0,
            "DELETE FROM \"t\" WHERE ((\"a\" = ? AND \"b\" = ?) OR \"a\" = ?)"
        );
        assert_eq!(
            out[0].1,
            vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)]
        );
    }

    #[test]
    fn test_wildcard_in_run_matches_everything() {
        let patches = vec![
            Patch::delete("t", Some(RowKey::new("t").with("a", 1_i64))),
            Patch::delete("t", Some(RowKey::new("t"))),
            Patch::delete("t", None),
        ];
        let out = compile(BulkCompiler::new(), &patches);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, "DELETE FROM \"t\" WHERE (1=1)");
        assert!(out[0].1.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(compile(BulkCompiler::new(), &[]).is_empty());
    }
}
