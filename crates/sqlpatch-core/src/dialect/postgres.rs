//! PostgreSQL dialect.

use super::{ColumnInfo, Dialect, PlaceholderFormat, ScanType};

/// PostgreSQL dialect: double-quoted identifiers and `$n` placeholders.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder_format(&self) -> PlaceholderFormat {
        PlaceholderFormat::Dollar
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn scan_type_of(&self, column: &ColumnInfo) -> ScanType {
        match column.type_name.to_ascii_lowercase().as_str() {
            "int2" | "int4" | "int8" | "smallint" | "integer" | "bigint" => ScanType::Integer,
            "float4" | "float8" | "real" | "double precision" | "numeric" => ScanType::Real,
            "bool" | "boolean" => ScanType::Bool,
            "bytea" => ScanType::Blob,
            _ => ScanType::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_dialect() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.name(), "postgres");
        assert_eq!(dialect.quote("user"), "\"user\"");
        assert_eq!(dialect.placeholder_format(), PlaceholderFormat::Dollar);
        assert!(dialect.supports_returning());
    }

    #[test]
    fn test_postgres_scan_types() {
        let dialect = PostgresDialect::new();
        assert_eq!(
            dialect.scan_type_of(&ColumnInfo::new("id", "INT8")),
            ScanType::Integer
        );
        assert_eq!(
            dialect.scan_type_of(&ColumnInfo::new("payload", "bytea")),
            ScanType::Blob
        );
        assert_eq!(
            dialect.scan_type_of(&ColumnInfo::new("name", "varchar")),
            ScanType::Text
        );
    }
}
