//! Parameterised predicate expressions.

use super::value::{SqlValue, ToSqlValue};

/// SQL for a predicate that matches every row.
pub const ALWAYS_TRUE: &str = "(1=1)";

/// A SQL expression with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprBuilder {
    sql: String,
    params: Vec<SqlValue>,
}

impl ExprBuilder {
    /// Creates a new expression from raw SQL.
    ///
    /// **Warning**: Only use this for SQL fragments that don't contain user input.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: vec![],
        }
    }

    /// Creates a column reference expression from an already quoted name.
    #[must_use]
    pub fn column(quoted: &str) -> Self {
        Self::raw(quoted)
    }

    /// Creates an expression from a value (parameterized).
    #[must_use]
    pub fn value<T: ToSqlValue>(value: T) -> Self {
        Self {
            sql: String::from("?"),
            params: vec![value.to_sql_value()],
        }
    }

    /// The predicate matching every row, `(1=1)`.
    #[must_use]
    pub fn always_true() -> Self {
        Self::raw(ALWAYS_TRUE)
    }

    fn binary(left: Self, op: &str, right: Self) -> Self {
        let mut params = left.params;
        params.extend(right.params);
        Self {
            sql: format!("{} {op} {}", left.sql, right.sql),
            params,
        }
    }

    /// Creates an equality expression; a NULL value renders `IS NULL`.
    #[must_use]
    pub fn eq<T: ToSqlValue>(self, value: T) -> Self {
        match value.to_sql_value() {
            SqlValue::Null => self.is_null(),
            value => Self::binary(self, "=", value.into()),
        }
    }

    /// Creates an IS NULL expression.
    #[must_use]
    pub fn is_null(self) -> Self {
        Self {
            sql: format!("{} IS NULL", self.sql),
            params: self.params,
        }
    }

    /// Creates an AND expression.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::binary(self, "AND", other)
    }

    /// Creates an OR expression.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::binary(self, "OR", other)
    }

    /// Wraps the expression in parentheses.
    #[must_use]
    pub fn paren(self) -> Self {
        Self {
            sql: format!("({})", self.sql),
            params: self.params,
        }
    }

    /// Joins the expressions with AND.
    ///
    /// Returns `None` when `exprs` is empty.
    pub fn conjunction(exprs: impl IntoIterator<Item = Self>) -> Option<Self> {
        exprs.into_iter().reduce(Self::and)
    }

    /// Joins the expressions with OR and wraps the result in parentheses.
    ///
    /// Returns `None` when `exprs` is empty.
    pub fn disjunction(exprs: impl IntoIterator<Item = Self>) -> Option<Self> {
        exprs.into_iter().reduce(Self::or).map(Self::paren)
    }

    /// Returns the SQL string.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the parameters.
    #[must_use]
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Consumes the builder and returns the SQL and parameters.
    #[must_use]
    pub fn build(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.params)
    }
}

impl From<SqlValue> for ExprBuilder {
    fn from(value: SqlValue) -> Self {
        Self {
            sql: String::from("?"),
            params: vec![value],
        }
    }
}
