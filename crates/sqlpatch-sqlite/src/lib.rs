//! # sqlpatch-sqlite
//!
//! SQLite-specific extensions for `sqlpatch-core`.
//!
//! # How SQLite differs from other dialects
//!
//! - **Identifier quoting**: this crate quotes with backticks. SQLite
//!   also accepts double quotes and square brackets. See
//!   [SQLite keywords].
//! - **Placeholders**: plain `?`, so compiled statements bind as-is.
//! - **[Type affinity]**: any column can store any value regardless of
//!   its declared type (unless [`STRICT` tables] are used). Untyped
//!   result columns are therefore scanned by declared-type affinity.
//! - **[RETURNING]**: supported on INSERT, UPDATE, and DELETE (since
//!   SQLite 3.35.0). [`ReturningHook`] adds it to compiled statements.
//! - **[UPSERT]**: `INSERT ... ON CONFLICT DO NOTHING` and
//!   `ON CONFLICT DO UPDATE SET ...` (since SQLite 3.24.0). [`UpsertHook`]
//!   turns compiled inserts into upserts.
//!
//! [UPSERT]: https://www.sqlite.org/lang_upsert.html
//! [RETURNING]: https://www.sqlite.org/lang_returning.html
//! [SQLite keywords]: https://www.sqlite.org/lang_keywords.html
//! [Type affinity]: https://www.sqlite.org/datatype3.html
//! [`STRICT` tables]: https://www.sqlite.org/stricttables.html
//!
//! ## Example
//!
//! ```rust
//! use sqlpatch_core::builder::SqlValue;
//! use sqlpatch_core::compiler::{BulkCompiler, CompilerOptions, PatchCompiler};
//! use sqlpatch_core::dialect::DialectRegistry;
//! use sqlpatch_core::Patch;
//!
//! let mut registry = DialectRegistry::new();
//! sqlpatch_sqlite::register(&mut registry);
//! let dialect = registry.get("sqlite3").unwrap();
//!
//! let patches = vec![
//!     Patch::insert(
//!         "testing",
//!         ["id", "name"],
//!         vec![SqlValue::Int(1), SqlValue::Text("a".into())],
//!     ),
//!     Patch::insert(
//!         "testing",
//!         ["id", "name"],
//!         vec![SqlValue::Int(2), SqlValue::Text("b".into())],
//!     ),
//! ];
//! let stmts = BulkCompiler::new().compile(&CompilerOptions::new(dialect.as_ref(), &patches));
//! let (sql, params) = stmts[0].build().unwrap();
//!
//! assert_eq!(sql, "INSERT INTO `testing` (`id`,`name`) VALUES (?,?),(?,?)");
//! assert_eq!(params.len(), 4);
//! ```

mod dialect;
mod returning;
mod upsert;

pub use dialect::{register, SqliteDialect, DIALECT_NAME};
pub use returning::ReturningHook;
pub use upsert::{ConflictAction, UpsertHook};
