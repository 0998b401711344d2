//! Row identification by table and column values.

use std::collections::BTreeMap;
use std::fmt;

use crate::builder::{ExprBuilder, SqlValue, ToSqlValue};
use crate::dialect::Dialect;

/// Identifies rows of a table by a set of column = value pairs.
///
/// Columns are kept sorted, so two keys built from the same pairs in a
/// different order compare equal and render identically.
#[derive(Debug, Clone, PartialEq)]
pub struct RowKey {
    table: String,
    key: BTreeMap<String, SqlValue>,
}

impl RowKey {
    /// Creates an empty key for `table`.
    ///
    /// An empty key matches every row of the table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key: BTreeMap::new(),
        }
    }

    /// Creates a key from column/value pairs.
    pub fn from_pairs<I, C, V>(table: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<String>,
        V: ToSqlValue,
    {
        Self {
            table: table.into(),
            key: pairs
                .into_iter()
                .map(|(column, value)| (column.into(), value.to_sql_value()))
                .collect(),
        }
    }

    /// Adds a column to the key.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl ToSqlValue) -> Self {
        self.insert(column, value);
        self
    }

    /// Adds a column to the key in place, replacing any previous value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl ToSqlValue) {
        self.key.insert(column.into(), value.to_sql_value());
    }

    /// Returns the table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Returns true when the key has no columns, i.e. it matches every row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }

    /// Returns the number of key columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.key.len()
    }

    /// Returns the value for `column`, if part of the key.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.key.get(column)
    }

    /// Iterates over the (column, value) pairs sorted by column name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.key.iter().map(|(column, value)| (column.as_str(), value))
    }

    /// Returns the sorted column names and their values.
    #[must_use]
    pub fn row_key(&self) -> (Vec<&str>, Vec<&SqlValue>) {
        self.iter().unzip()
    }

    /// Renders the canonical key string, `table;col=value;col=value`.
    ///
    /// Values render as SQL literals (`1`, `'text'`, `x'00ff'`) and `\`, `;`,
    /// `=` and `#` are escaped in names, so distinct keys never share a
    /// string.
    #[must_use]
    pub fn key_string(&self) -> String {
        let mut out = escape_name(&self.table);
        for (column, value) in self.iter() {
            out.push(';');
            out.push_str(&escape_name(column));
            out.push('=');
            out.push_str(&value.key_fragment());
        }
        out
    }

    /// Builds the predicate selecting the rows this key identifies.
    ///
    /// Identifiers are quoted through `dialect`. An empty key yields the
    /// always-true predicate `(1=1)`.
    #[must_use]
    pub fn to_predicate(&self, dialect: &dyn Dialect) -> ExprBuilder {
        ExprBuilder::conjunction(self.iter().map(|(column, value)| {
            ExprBuilder::column(&dialect.quote(column)).eq(value.clone())
        }))
        .unwrap_or_else(ExprBuilder::always_true)
    }
}

fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '\\' | ';' | '=' | '#') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key_string())
    }
}
