//! # sqlpatch-core
//!
//! Database-independent half of the sqlpatch ORM.
//!
//! This crate provides:
//! - [`Patch`] and [`RowKey`]: pending row mutations and order-independent row
//!   identification
//! - A patch compiler with a one-statement-per-patch strategy and a bulk
//!   strategy merging adjacent compatible patches
//! - A [`Dialect`](dialect::Dialect) capability and an explicit
//!   [`DialectRegistry`](dialect::DialectRegistry)
//! - Entity schema metadata ([`MetaSchema`]) derived once from registered types
//! - A request-scoped identity cache ([`ScopeCache`]) and a depth-bounded,
//!   breadth-first association loader ([`include()`](include::include))
//!
//! Nothing here performs I/O; executing statements is left to a driver such
//! as `sqlpatch-orm`.
//!
//! ## Bulk compilation
//!
//! ```rust
//! use sqlpatch_core::builder::SqlValue;
//! use sqlpatch_core::compiler::{BulkCompiler, CompilerOptions, PatchCompiler};
//! use sqlpatch_core::dialect::GenericDialect;
//! use sqlpatch_core::Patch;
//!
//! let dialect = GenericDialect::new();
//! let patches: Vec<Patch> = (1..=3)
//!     .map(|id| Patch::insert("testing", ["id"], vec![SqlValue::Int(id)]))
//!     .collect();
//!
//! let stmts = BulkCompiler::new().compile(&CompilerOptions::new(&dialect, &patches));
//! let (sql, params) = stmts[0].build().unwrap();
//!
//! assert_eq!(sql, r#"INSERT INTO "testing" ("id") VALUES (?),(?),(?)"#);
//! assert_eq!(params.len(), 3);
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Values are always bound as parameters and identifiers are always quoted
//! by the dialect:
//!
//! ```rust
//! use sqlpatch_core::builder::Statement;
//! use sqlpatch_core::compiler::{CompilerOptions, DefaultCompiler, PatchCompiler};
//! use sqlpatch_core::dialect::GenericDialect;
//! use sqlpatch_core::{Patch, RowKey};
//!
//! let user_input = "'; DROP TABLE users; --";
//! let dialect = GenericDialect::new();
//! let patches = vec![Patch::delete(
//!     "users",
//!     Some(RowKey::new("users").with("name", user_input)),
//! )];
//!
//! let stmts = DefaultCompiler::new().compile(&CompilerOptions::new(&dialect, &patches));
//! let (sql, _params) = stmts[0].build().unwrap();
//! assert_eq!(sql, r#"DELETE FROM "users" WHERE "name" = ?"#);
//! ```

pub mod builder;
pub mod cache;
pub mod cancel;
pub mod compiler;
pub mod dialect;
pub mod error;
pub mod include;
pub mod patch;
pub mod row_key;
pub mod schema;

pub use builder::{SqlValue, Statement, ToSqlValue};
pub use cache::ScopeCache;
pub use cancel::Cancel;
pub use compiler::{BulkCompiler, CompilerHook, CompilerOptions, DefaultCompiler, PatchCompiler};
pub use error::{Error, Result};
pub use patch::{Patch, PatchKind};
pub use row_key::RowKey;
pub use schema::{Cardinality, Entity, MetaSchema};
