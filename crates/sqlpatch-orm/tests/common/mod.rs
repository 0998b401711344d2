#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDateTime;
use sqlpatch_core::schema::{BelongsTo, HasMany};
use sqlpatch_core::MetaSchema;
use sqlpatch_derive::Entity;
use sqlpatch_orm::DbContext;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

// =============================================================================
// Entities
// =============================================================================

#[derive(Debug, Default, Entity, sqlx::FromRow)]
#[entity(table = "blogs")]
pub struct Blog {
    #[column(primary_key)]
    pub blog_id: i64,
    pub name: String,
    #[relation(foreign_key = "blog_id")]
    #[sqlx(skip)]
    pub posts: HasMany<Post>,
}

#[derive(Debug, Default, Entity, sqlx::FromRow)]
#[entity(table = "posts")]
pub struct Post {
    #[column(primary_key)]
    pub post_id: i64,
    pub blog_id: i64,
    #[column(omit_empty)]
    pub title: String,
    pub published_at: Option<NaiveDateTime>,
    #[relation(foreign_key = "blog_id")]
    #[sqlx(skip)]
    pub blog: BelongsTo<Blog>,
}

pub fn blog(blog_id: i64, name: &str) -> Blog {
    Blog {
        blog_id,
        name: name.to_string(),
        ..Blog::default()
    }
}

pub fn post(post_id: i64, blog_id: i64, title: &str) -> Post {
    Post {
        post_id,
        blog_id,
        title: title.to_string(),
        ..Post::default()
    }
}

pub fn schema() -> Arc<MetaSchema> {
    let meta = MetaSchema::new();
    meta.register::<Blog>();
    meta.register::<Post>();
    meta.compute();
    Arc::new(meta)
}

// =============================================================================
// Database
// =============================================================================

pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");

    for sql in [
        "CREATE TABLE blogs (blog_id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
        "CREATE TABLE posts (
            post_id INTEGER PRIMARY KEY,
            blog_id INTEGER NOT NULL,
            title TEXT NOT NULL DEFAULT 'untitled',
            published_at DATETIME
        )",
        "CREATE TABLE testing (id INTEGER PRIMARY KEY, name TEXT)",
    ] {
        sqlx::query(sql)
            .execute(&pool)
            .await
            .expect("Failed to create table");
    }
    pool
}

pub async fn create_test_context() -> DbContext {
    DbContext::sqlite(create_test_pool().await).with_meta(schema())
}

pub async fn count(ctx: &DbContext, table: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(ctx.pool())
        .await
        .expect("Failed to count rows");
    n
}
