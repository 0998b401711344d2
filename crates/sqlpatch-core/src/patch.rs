//! Pending row mutations.

use std::fmt;

use crate::builder::SqlValue;
use crate::row_key::RowKey;

/// The kind of mutation a patch describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchKind {
    /// Insert a new row.
    Insert,
    /// Update existing rows.
    Update,
    /// Delete existing rows.
    Delete,
}

impl fmt::Display for PatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// A pending mutation of one table, not yet compiled to SQL.
///
/// `columns` and `values` are parallel and must have the same length. For
/// updates and deletes a `row_key` of `None` targets every row of the table;
/// that is a deliberate wildcard, not a missing filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Mutation kind.
    pub kind: PatchKind,
    /// Target table.
    pub table_name: String,
    /// Rows affected by an update or delete.
    pub row_key: Option<RowKey>,
    /// Column names, unique within the patch.
    pub columns: Vec<String>,
    /// Column values, parallel to `columns`.
    pub values: Vec<SqlValue>,
}

impl Patch {
    /// Creates an insert patch.
    pub fn insert<C: Into<String>>(
        table_name: impl Into<String>,
        columns: impl IntoIterator<Item = C>,
        values: Vec<SqlValue>,
    ) -> Self {
        Self {
            kind: PatchKind::Insert,
            table_name: table_name.into(),
            row_key: None,
            columns: columns.into_iter().map(Into::into).collect(),
            values,
        }
    }

    /// Creates an update patch.
    pub fn update<C: Into<String>>(
        table_name: impl Into<String>,
        row_key: Option<RowKey>,
        columns: impl IntoIterator<Item = C>,
        values: Vec<SqlValue>,
    ) -> Self {
        Self {
            kind: PatchKind::Update,
            table_name: table_name.into(),
            row_key,
            columns: columns.into_iter().map(Into::into).collect(),
            values,
        }
    }

    /// Creates a delete patch.
    pub fn delete(table_name: impl Into<String>, row_key: Option<RowKey>) -> Self {
        Self {
            kind: PatchKind::Delete,
            table_name: table_name.into(),
            row_key,
            columns: vec![],
            values: vec![],
        }
    }

    /// Returns true when the patch targets every row of its table.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.row_key.as_ref().is_none_or(RowKey::is_empty)
    }

    /// Panics unless `columns` and `values` have the same length.
    ///
    /// # Panics
    ///
    /// A mismatch is a caller bug; compiling it would produce a malformed
    /// statement.
    pub fn assert_well_formed(&self) {
        assert!(
            self.columns.len() == self.values.len(),
            "sqlpatch: number of columns and values are mismatched ({} columns, {} values) in {} patch for {}",
            self.columns.len(),
            self.values.len(),
            self.kind,
            self.table_name
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let insert = Patch::insert("users", ["id", "name"], vec![SqlValue::Int(1), SqlValue::Null]);
        assert_eq!(insert.kind, PatchKind::Insert);
        assert_eq!(insert.columns, vec!["id", "name"]);
        assert!(insert.row_key.is_none());

        let delete = Patch::delete("users", Some(RowKey::new("users").with("id", 1_i64)));
        assert_eq!(delete.kind, PatchKind::Delete);
        assert!(delete.columns.is_empty());
        assert!(!delete.is_wildcard());
    }

    #[test]
    fn test_wildcards() {
        assert!(Patch::delete("users", None).is_wildcard());
        assert!(Patch::delete("users", Some(RowKey::new("users"))).is_wildcard());
    }

    #[test]
    #[should_panic(expected = "number of columns and values are mismatched")]
    fn test_mismatch_panics() {
        Patch::insert("users", ["id", "name"], vec![SqlValue::Int(1)]).assert_well_formed();
    }
}
