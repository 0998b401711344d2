//! SQL statement builders.
//!
//! Builders render parameterised SQL; values never appear in the SQL text.
//! The patch compiler produces them through a dialect-bound
//! [`StatementBuilder`], so every identifier is quoted by the dialect.
//!
//! # Example
//!
//! ```rust
//! use sqlpatch_core::builder::{Statement, StatementBuilder, SqlValue};
//! use sqlpatch_core::dialect::PostgresDialect;
//!
//! let dialect = PostgresDialect::new();
//! let (sql, params) = StatementBuilder::new(&dialect)
//!     .insert("users", &["id", "name"])
//!     .values(vec![SqlValue::Int(1), SqlValue::Text("alice".into())])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(sql, r#"INSERT INTO "users" ("id","name") VALUES ($1,$2)"#);
//! assert_eq!(params.len(), 2);
//! ```

mod delete;
mod expr;
mod insert;
mod update;
pub mod value;

use std::fmt;

pub use delete::DeleteBuilder;
pub use expr::{ExprBuilder, ALWAYS_TRUE};
pub use insert::InsertBuilder;
pub use update::UpdateBuilder;
pub use value::{SqlValue, ToSqlValue};

use crate::dialect::Dialect;
use crate::error::Result;

/// Anything that renders to a SQL statement with bound parameters.
///
/// The compiler emits `Box<dyn Statement>` so that a compiler hook can
/// replace its builders with any statement-like object.
pub trait Statement: Send + Sync + fmt::Debug {
    /// Renders the statement.
    fn build(&self) -> Result<(String, Vec<SqlValue>)>;
}

impl<S: Statement + ?Sized> Statement for Box<S> {
    fn build(&self) -> Result<(String, Vec<SqlValue>)> {
        (**self).build()
    }
}

/// A statement given as finished SQL text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStatement {
    sql: String,
    params: Vec<SqlValue>,
}

impl RawStatement {
    /// Creates a raw statement.
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl Statement for RawStatement {
    fn build(&self) -> Result<(String, Vec<SqlValue>)> {
        Ok((self.sql.clone(), self.params.clone()))
    }
}

/// Creates statement builders that quote identifiers and number
/// placeholders the way `dialect` expects.
#[derive(Clone, Copy)]
pub struct StatementBuilder<'d> {
    dialect: &'d dyn Dialect,
}

impl<'d> StatementBuilder<'d> {
    /// Creates a factory bound to `dialect`.
    #[must_use]
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self { dialect }
    }

    /// Returns the bound dialect.
    #[must_use]
    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Quotes an identifier through the dialect.
    #[must_use]
    pub fn quote(&self, identifier: &str) -> String {
        self.dialect.quote(identifier)
    }

    /// Starts an INSERT into `table` with the given columns.
    #[must_use]
    pub fn insert<S: AsRef<str>>(&self, table: &str, columns: &[S]) -> InsertBuilder {
        InsertBuilder::new(self.quote(table))
            .columns(columns.iter().map(|c| self.quote(c.as_ref())))
            .placeholder_format(self.dialect.placeholder_format())
    }

    /// Starts an UPDATE of `table` assigning `columns` to `values` in order.
    #[must_use]
    pub fn update<S: AsRef<str>>(
        &self,
        table: &str,
        columns: &[S],
        values: &[SqlValue],
    ) -> UpdateBuilder {
        columns.iter().zip(values).fold(
            UpdateBuilder::new(self.quote(table))
                .placeholder_format(self.dialect.placeholder_format()),
            |stmt, (column, value)| stmt.set(self.quote(column.as_ref()), value.clone()),
        )
    }

    /// Starts a DELETE from `table`.
    #[must_use]
    pub fn delete(&self, table: &str) -> DeleteBuilder {
        DeleteBuilder::new(self.quote(table)).placeholder_format(self.dialect.placeholder_format())
    }
}

impl fmt::Debug for StatementBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementBuilder")
            .field("dialect", &self.dialect.name())
            .finish()
    }
}
