//! SQLite dialect implementation.

use sqlpatch_core::dialect::{scan_type_by_affinity, ColumnInfo, Dialect, DialectRegistry, ScanType};

/// Name the SQLite dialect is registered under.
pub const DIALECT_NAME: &str = "sqlite3";

/// SQLite dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        DIALECT_NAME
    }

    fn identifier_quote(&self) -> char {
        '`' // SQLite also accepts double quotes and square brackets
    }

    fn supports_returning(&self) -> bool {
        true // SQLite 3.35.0+
    }

    fn scan_type_of(&self, column: &ColumnInfo) -> ScanType {
        // Expressions and aggregates carry no declared type.
        if column.type_name.eq_ignore_ascii_case("NULL") {
            return ScanType::Text;
        }
        scan_type_by_affinity(&column.type_name)
    }
}

/// Registers [`SqliteDialect`] under `sqlite3`.
///
/// # Panics
///
/// Panics if `sqlite3` is already registered.
pub fn register(registry: &mut DialectRegistry) {
    registry.register(DIALECT_NAME, SqliteDialect::new());
}
