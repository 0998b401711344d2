//! UPDATE statement builder.

use super::expr::ExprBuilder;
use super::value::SqlValue;
use super::Statement;
use crate::dialect::PlaceholderFormat;
use crate::error::{Error, Result};

/// An assignment in the SET clause.
#[derive(Debug, Clone, PartialEq)]
struct Assignment {
    column: String,
    value: SqlValue,
}

/// An UPDATE statement builder.
///
/// Table and column names are taken verbatim; quote them through the
/// dialect first.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBuilder {
    table: String,
    assignments: Vec<Assignment>,
    where_clause: Option<ExprBuilder>,
    suffix: Option<String>,
    placeholder: PlaceholderFormat,
}

impl UpdateBuilder {
    /// Creates a new UPDATE builder for `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            assignments: vec![],
            where_clause: None,
            suffix: None,
            placeholder: PlaceholderFormat::Question,
        }
    }

    /// Adds a SET assignment.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: SqlValue) -> Self {
        self.assignments.push(Assignment {
            column: column.into(),
            value,
        });
        self
    }

    /// Adds a WHERE clause.
    #[must_use]
    pub fn where_clause(mut self, expr: ExprBuilder) -> Self {
        self.where_clause = Some(expr);
        self
    }

    /// Appends raw SQL after the WHERE clause (e.g. `RETURNING *`).
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

    /// Returns true if a WHERE clause is specified.
    #[must_use]
    pub const fn has_where_clause(&self) -> bool {
        self.where_clause.is_some()
    }
}

impl Statement for UpdateBuilder {
    fn build(&self) -> Result<(String, Vec<SqlValue>)> {
        if self.table.is_empty() {
            return Err(Error::invalid("update statements must specify a table"));
        }
        if self.assignments.is_empty() {
            return Err(Error::invalid(
                "update statements must have at least one Set clause",
            ));
        }

        let mut sql = String::from("UPDATE ");
        let mut params = vec![];

        sql.push_str(&self.table);
        sql.push_str(" SET ");

        let set_parts: Vec<String> = self
            .assignments
            .iter()
            .map(|a| format!("{} = ?", a.column))
            .collect();
        sql.push_str(&set_parts.join(", "));
        params.extend(self.assignments.iter().map(|a| a.value.clone()));

        if let Some(ref where_expr) = self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(where_expr.sql());
            params.extend(where_expr.params().iter().cloned());
        }

        if let Some(ref suffix) = self.suffix {
            sql.push(' ');
            sql.push_str(suffix);
        }

        Ok((self.placeholder.replace(&sql), params))
    }
}
