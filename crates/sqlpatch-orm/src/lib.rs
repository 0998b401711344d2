//! # sqlpatch-orm
//!
//! Runs `sqlpatch-core` against a SQLite database through `sqlx`.
//!
//! This crate provides:
//! - [`DbContext`]: buffers patches, compiles them (one statement per
//!   patch, or merged in bulk) and executes the result
//! - untyped row scanning through the dialect ([`ScannedRow`])
//! - include traversals bounded by the configured depth
//! - transaction scopes ([`TxScope`], [`tx_scope`])
//! - [`ContextConfig`], loadable from JSON
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sqlpatch_core::MetaSchema;
//! use sqlpatch_derive::Entity;
//! use sqlpatch_orm::DbContext;
//! use sqlx::SqlitePool;
//!
//! #[derive(Entity)]
//! #[entity(table = "blogs")]
//! struct Blog {
//!     #[column(primary_key)]
//!     blog_id: i64,
//!     name: String,
//! }
//!
//! # async fn run(pool: SqlitePool) -> sqlpatch_orm::Result<()> {
//! let meta = MetaSchema::new();
//! meta.register::<Blog>();
//! meta.compute();
//!
//! let mut ctx = DbContext::sqlite(pool).with_meta(Arc::new(meta));
//! ctx.insert(&Blog { blog_id: 1, name: "news".into() });
//! ctx.save_changes().await?;
//!
//! let rows = ctx.fetch("SELECT * FROM blogs", vec![]).await?;
//! assert_eq!(rows.len(), 1);
//! # Ok(())
//! # }
//! ```

mod config;
mod context;
mod error;
mod scan;
mod tx;

pub use config::ContextConfig;
pub use context::DbContext;
pub use error::{OrmError, Result};
pub use scan::{scan_row, scan_rows, ScannedRow};
pub use tx::{tx_scope, TxScope};
