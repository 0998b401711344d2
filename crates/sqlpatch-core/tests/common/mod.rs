#![allow(dead_code)]

use std::sync::Arc;

use sqlpatch_core::builder::{SqlValue, Statement};
use sqlpatch_core::compiler::{CompilerOptions, PatchCompiler};
use sqlpatch_core::dialect::Dialect;
use sqlpatch_core::schema::{BelongsTo, HasMany};
use sqlpatch_core::{MetaSchema, Patch};
use sqlpatch_derive::Entity;

/// Backtick quoting and `?` placeholders, like MySQL or SQLite.
#[derive(Debug, Default)]
pub struct BacktickDialect;

impl Dialect for BacktickDialect {
    fn name(&self) -> &'static str {
        "backtick"
    }

    fn identifier_quote(&self) -> char {
        '`'
    }
}

pub fn compile(compiler: &dyn PatchCompiler, patches: &[Patch]) -> Vec<(String, Vec<SqlValue>)> {
    let dialect = BacktickDialect;
    render(&compiler.compile(&CompilerOptions::new(&dialect, patches)))
}

pub fn render(stmts: &[Box<dyn Statement>]) -> Vec<(String, Vec<SqlValue>)> {
    stmts
        .iter()
        .map(|stmt| {
            stmt.build()
                .unwrap_or_else(|e| panic!("Failed to render {stmt:?}\nError: {e}"))
        })
        .collect()
}

pub fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

#[derive(Entity, Default)]
#[entity(table = "blogs")]
pub struct Blog {
    #[column(primary_key)]
    pub blog_id: i64,
    pub name: String,
    #[relation(foreign_key = "blog_id")]
    pub posts: HasMany<Post>,
}

#[derive(Entity, Default)]
#[entity(table = "posts")]
pub struct Post {
    #[column(primary_key)]
    pub post_id: i64,
    pub blog_id: i64,
    #[column(omit_empty)]
    pub title: String,
    #[relation(foreign_key = "blog_id")]
    pub blog: BelongsTo<Blog>,
}

/// A self-referencing tree: every node points at its parent.
#[derive(Entity, Default)]
pub struct TreeNode {
    #[column(primary_key)]
    pub id: i64,
    pub parent_id: i64,
    #[relation(foreign_key = "parent_id:id")]
    pub parent: BelongsTo<TreeNode>,
}

pub fn blog_schema() -> Arc<MetaSchema> {
    let meta = MetaSchema::new();
    meta.register::<Blog>();
    meta.register::<Post>();
    meta.register::<TreeNode>();
    meta.compute();
    Arc::new(meta)
}
