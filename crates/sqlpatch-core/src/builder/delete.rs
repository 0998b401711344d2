//! DELETE statement builder.

use super::expr::ExprBuilder;
use super::value::SqlValue;
use super::Statement;
use crate::dialect::PlaceholderFormat;
use crate::error::{Error, Result};

/// A DELETE statement builder.
///
/// **Important**: DELETE without WHERE deletes all rows. The patch compiler
/// always attaches a predicate, using `(1=1)` for deliberate wildcards.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteBuilder {
    table: String,
    where_clause: Option<ExprBuilder>,
    suffix: Option<String>,
    placeholder: PlaceholderFormat,
}

impl DeleteBuilder {
    /// Creates a new DELETE builder for `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            where_clause: None,
            suffix: None,
            placeholder: PlaceholderFormat::Question,
        }
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

impl Statement for DeleteBuilder {
    fn build(&self) -> Result<(String, Vec<SqlValue>)> {
        if self.table.is_empty() {
            return Err(Error::invalid("delete statements must specify a table"));
        }

        let mut sql = String::from("DELETE FROM ");
        let mut params = vec![];

        sql.push_str(&self.table);

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_delete() {
        let (sql, params) = DeleteBuilder::new("users")
            .where_clause(ExprBuilder::column("id").eq(1_i32))
            .build()
            .unwrap();

        assert_eq!(sql, "DELETE FROM users WHERE id = ?");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_delete_all() {
        let builder = DeleteBuilder::new("temp_data");
        assert!(!builder.has_where_clause());

        let (sql, params) = builder.build().unwrap();
        assert_eq!(sql, "DELETE FROM temp_data");
        assert!(params.is_empty());
    }

    #[test]
    fn test_delete_wildcard() {
        let (sql, params) = DeleteBuilder::new("temp_data")
            .where_clause(ExprBuilder::always_true())
            .build()
            .unwrap();

        assert_eq!(sql, "DELETE FROM temp_data WHERE (1=1)");
        assert!(params.is_empty());
    }

    #[test]
    fn test_delete_sql_injection_prevention() {
        let malicious = "1; DROP TABLE users; --";
        let (sql, params) = DeleteBuilder::new("users")
            .where_clause(ExprBuilder::column("id").eq(malicious))
            .build()
            .unwrap();

        assert_eq!(sql, "DELETE FROM users WHERE id = ?");
        assert!(matches!(&params[0], SqlValue::Text(s) if s == malicious));
    }
}
