//! INSERT statement builder.

use super::value::SqlValue;
use super::Statement;
use crate::dialect::PlaceholderFormat;
use crate::error::{Error, Result};

/// A multi-row INSERT statement builder.
///
/// Table and column names are taken verbatim; quote them through the
/// dialect first (see [`StatementBuilder`](super::StatementBuilder)).
#[derive(Debug, Clone, PartialEq)]
pub struct InsertBuilder {
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
    suffix: Option<String>,
    placeholder: PlaceholderFormat,
}

impl InsertBuilder {
    /// Creates a new INSERT builder for `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: vec![],
            rows: vec![],
            suffix: None,
            placeholder: PlaceholderFormat::Question,
        }
    }

    /// Specifies the columns to insert into.
    #[must_use]
    pub fn columns<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a row of values to insert.
    #[must_use]
    pub fn values(mut self, row: Vec<SqlValue>) -> Self {
        self.rows.push(row);
        self
    }

    /// Adds a row of values in place.
    pub fn push_values(&mut self, row: Vec<SqlValue>) {
        self.rows.push(row);
    }

    /// Appends raw SQL after the VALUES list (e.g. `RETURNING "id"`).
    #[must_use]
    pub fn suffix(mut self, sql: impl Into<String>) -> Self {
        self.suffix = Some(sql.into());
        self
    }

    /// Sets the placeholder style used when rendering.
    #[must_use]
    pub const fn placeholder_format(mut self, format: PlaceholderFormat) -> Self {
        self.placeholder = format;
        self
    }

    /// Returns the (quoted) table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the (quoted) column names.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Returns the rows added so far.
    #[must_use]
    pub fn rows(&self) -> &[Vec<SqlValue>] {
        &self.rows
    }
}

impl Statement for InsertBuilder {
    fn build(&self) -> Result<(String, Vec<SqlValue>)> {
        if self.table.is_empty() {
            return Err(Error::invalid("insert statements must specify a table"));
        }
        if self.rows.is_empty() {
            return Err(Error::invalid(
                "insert statements must have at least one set of values",
            ));
        }
        if !self.columns.is_empty() {
            if let Some(row) = self.rows.iter().find(|row| row.len() != self.columns.len()) {
                return Err(Error::invalid(format!(
                    "insert row has {} values for {} columns",
                    row.len(),
                    self.columns.len()
                )));
            }
        }

        let mut sql = String::from("INSERT INTO ");
        sql.push_str(&self.table);

        if !self.columns.is_empty() {
            sql.push_str(" (");
            sql.push_str(&self.columns.join(","));
            sql.push(')');
        }

        sql.push_str(" VALUES ");
        let row_strs: Vec<String> = self
            .rows
            .iter()
            .map(|row| format!("({})", vec!["?"; row.len()].join(",")))
            .collect();
        sql.push_str(&row_strs.join(","));

        if let Some(ref suffix) = self.suffix {
            sql.push(' ');
            sql.push_str(suffix);
        }

        let params = self.rows.iter().flatten().cloned().collect();
        Ok((self.placeholder.replace(&sql), params))
    }
}
