//! SQL Dialect support.
//!
//! Different databases quote identifiers, number placeholders and report
//! column types differently. The compiler never assumes any of these and
//! goes through [`Dialect`] for every identifier it emits.

mod generic;
mod placeholder;
mod postgres;
mod registry;

pub use generic::GenericDialect;
pub use placeholder::PlaceholderFormat;
pub use postgres::PostgresDialect;
pub use registry::DialectRegistry;

/// Column metadata reported by a driver for a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name as reported by the driver.
    pub name: String,
    /// Declared database type name (e.g. `INTEGER`, `varchar(255)`).
    pub type_name: String,
}

impl ColumnInfo {
    /// Creates column metadata.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// The Rust-side type an untyped result column is decoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanType {
    /// Decoded as `i64`.
    Integer,
    /// Decoded as `f64`.
    Real,
    /// Decoded as `String`.
    Text,
    /// Decoded as `Vec<u8>`.
    Blob,
    /// Decoded as `bool`.
    Bool,
}

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character (e.g., `"` for standard SQL, `` ` `` for MySQL).
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Returns the parameter placeholder style.
    fn placeholder_format(&self) -> PlaceholderFormat {
        PlaceholderFormat::Question
    }

    /// Returns whether the dialect supports RETURNING clause.
    fn supports_returning(&self) -> bool {
        false
    }

    /// Quotes an identifier, doubling any embedded quote character.
    fn quote(&self, identifier: &str) -> String {
        let quote = self.identifier_quote();
        let mut escaped = String::with_capacity(identifier.len() + 2);
        escaped.push(quote);
        for c in identifier.chars() {
            if c == quote {
                escaped.push(quote);
            }
            escaped.push(c);
        }
        escaped.push(quote);
        escaped
    }

    /// Returns the type an untyped result column should be decoded into.
    fn scan_type_of(&self, column: &ColumnInfo) -> ScanType {
        scan_type_by_affinity(&column.type_name)
    }
}

/// Maps a declared column type to a scan type using SQLite-style affinity
/// rules, which are lenient enough to serve as a default for any engine.
#[must_use]
pub fn scan_type_by_affinity(type_name: &str) -> ScanType {
    let declared = type_name.to_ascii_uppercase();
    if declared.starts_with("BOOL") {
        ScanType::Bool
    } else if declared.contains("INT") {
        ScanType::Integer
    } else if declared.contains("REAL") || declared.contains("FLOA") || declared.contains("DOUB") {
        ScanType::Real
    } else if declared.contains("BLOB") || declared == "BYTEA" {
        ScanType::Blob
    } else {
        ScanType::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes_embedded_quotes() {
        let dialect = GenericDialect::new();
        assert_eq!(dialect.quote("users"), "\"users\"");
        assert_eq!(dialect.quote("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_scan_type_by_affinity() {
        assert_eq!(scan_type_by_affinity("INTEGER"), ScanType::Integer);
        assert_eq!(scan_type_by_affinity("bigint"), ScanType::Integer);
        assert_eq!(scan_type_by_affinity("varchar(255)"), ScanType::Text);
        assert_eq!(scan_type_by_affinity("DOUBLE PRECISION"), ScanType::Real);
        assert_eq!(scan_type_by_affinity("blob"), ScanType::Blob);
        assert_eq!(scan_type_by_affinity("BOOLEAN"), ScanType::Bool);
        assert_eq!(scan_type_by_affinity(""), ScanType::Text);
    }
}
