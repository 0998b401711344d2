//! Binding [`SqlValue`]s and scanning untyped result rows.

use std::fmt;

use sqlpatch_core::builder::SqlValue;
use sqlpatch_core::dialect::{ColumnInfo, Dialect, ScanType};
use sqlx::query::{Query, QueryAs};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, FromRow, Row, Sqlite, TypeInfo, ValueRef};

use crate::error::Result;

/// A result row decoded without a target type: column names with their
/// values, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScannedRow {
    columns: Vec<(String, SqlValue)>,
}

impl ScannedRow {
    /// Returns the value of `column`, if selected.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns the column names in select order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true when the row has no column.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the values in select order.
    #[must_use]
    pub fn into_values(self) -> Vec<SqlValue> {
        self.columns.into_iter().map(|(_, value)| value).collect()
    }
}

impl fmt::Display for ScannedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={}", value.key_fragment())?;
        }
        Ok(())
    }
}

/// Decodes `rows` through the dialect's scan-type mapping.
///
/// Columns without a declared type (expressions, aggregates) fall back to
/// the storage class of the value itself.
///
/// # Errors
///
/// Returns [`OrmError::Database`](crate::OrmError::Database) when a value
/// cannot be decoded.
pub fn scan_rows(dialect: &dyn Dialect, rows: &[SqliteRow]) -> Result<Vec<ScannedRow>> {
    rows.iter().map(|row| scan_row(dialect, row)).collect()
}

/// Decodes a single row. See [`scan_rows`].
///
/// # Errors
///
/// Returns [`OrmError::Database`](crate::OrmError::Database) when a value
/// cannot be decoded.
pub fn scan_row(dialect: &dyn Dialect, row: &SqliteRow) -> Result<ScannedRow> {
    let mut columns = Vec::with_capacity(row.len());
    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i)?;
        if raw.is_null() {
            columns.push((column.name().to_string(), SqlValue::Null));
            continue;
        }

        let declared = column.type_info();
        let type_name = if declared.is_null() {
            raw.type_info().name().to_string()
        } else {
            declared.name().to_string()
        };
        let scan_type = dialect.scan_type_of(&ColumnInfo::new(column.name(), type_name));

        // SQLite converts between storage classes on read, so the
        // declared affinity wins over the stored class.
        let value = match scan_type {
            ScanType::Integer => SqlValue::Int(row.try_get_unchecked::<i64, _>(i)?),
            ScanType::Real => SqlValue::Float(row.try_get_unchecked::<f64, _>(i)?),
            ScanType::Bool => SqlValue::Bool(row.try_get_unchecked::<bool, _>(i)?),
            ScanType::Blob => SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(i)?),
            ScanType::Text => SqlValue::Text(row.try_get_unchecked::<String, _>(i)?),
        };
        columns.push((column.name().to_string(), value));
    }
    Ok(ScannedRow { columns })
}

/// Binds a [`SqlValue`] parameter to a query.
pub(crate) fn bind_param<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

/// Binds a [`SqlValue`] parameter to a `query_as` query.
pub(crate) fn bind_param_as<'q, T>(
    query: QueryAs<'q, Sqlite, T, SqliteArguments<'q>>,
    value: SqlValue,
) -> QueryAs<'q, Sqlite, T, SqliteArguments<'q>>
where
    T: for<'r> FromRow<'r, SqliteRow>,
{
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, SqlValue)]) -> ScannedRow {
        ScannedRow {
            columns: pairs
                .iter()
                .map(|(name, value)| ((*name).to_string(), value.clone()))
                .collect(),
        }
    }

    #[test]
    fn test_scanned_row_accessors() {
        let r = row(&[
            ("id", SqlValue::Int(1)),
            ("name", SqlValue::Text(String::from("a"))),
        ]);

        assert_eq!(r.len(), 2);
        assert_eq!(r.get("id"), Some(&SqlValue::Int(1)));
        assert_eq!(r.get("missing"), None);
        assert_eq!(r.column_names().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(r.to_string(), "id=1, name='a'");
        assert_eq!(
            r.into_values(),
            vec![SqlValue::Int(1), SqlValue::Text(String::from("a"))]
        );
    }
}
