//! Example: a blog with posts
//!
//! Saves a few entities in bulk inside a transaction, then loads the blog
//! graph back with an include traversal.
//!
//! Run with: cargo run --example blog -p sqlpatch-orm

use std::sync::Arc;

use sqlpatch_core::include::{IncludeLoaderFn, IncludeLoaderList};
use sqlpatch_core::schema::{downcast_arc, BelongsTo, Cardinality, Entity, HasMany};
use sqlpatch_core::{Error, MetaSchema, RowKey};
use sqlpatch_derive::Entity;
use sqlpatch_orm::{ContextConfig, DbContext, TxScope};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

// =============================================================================
// Entities
// =============================================================================

#[derive(Debug, Default, Entity, sqlx::FromRow)]
#[entity(table = "blogs")]
struct Blog {
    #[column(primary_key)]
    blog_id: i64,
    name: String,
    #[relation(foreign_key = "blog_id")]
    #[sqlx(skip)]
    posts: HasMany<Post>,
}

#[derive(Debug, Default, Entity, sqlx::FromRow)]
#[entity(table = "posts")]
struct Post {
    #[column(primary_key)]
    post_id: i64,
    blog_id: i64,
    title: String,
    #[relation(foreign_key = "blog_id")]
    #[sqlx(skip)]
    blog: BelongsTo<Blog>,
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE blogs (blog_id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
    "CREATE TABLE posts (
        post_id INTEGER PRIMARY KEY,
        blog_id INTEGER NOT NULL,
        title TEXT NOT NULL
    )",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;
    for sql in SCHEMA {
        sqlx::query(sql).execute(&pool).await?;
    }

    let meta = MetaSchema::new();
    meta.register::<Blog>();
    meta.register::<Post>();
    meta.compute();

    let config = ContextConfig::from_json_str(r#"{ "bulk": true, "max_patches": 100 }"#)?;
    let mut ctx = DbContext::sqlite(pool)
        .with_config(config)
        .with_meta(Arc::new(meta));

    // =========================================================================
    // Save
    // =========================================================================

    for (blog_id, name) in [(1, "rust"), (2, "databases")] {
        ctx.insert(&Blog {
            blog_id,
            name: name.to_string(),
            ..Blog::default()
        });
    }
    for (post_id, blog_id, title) in [
        (1, 1, "Ownership"),
        (2, 1, "Lifetimes"),
        (3, 2, "B-trees"),
    ] {
        ctx.insert(&Post {
            post_id,
            blog_id,
            title: title.to_string(),
            ..Post::default()
        });
    }

    let mut scope = TxScope::begin(ctx.pool()).await?;
    let result = ctx.save_changes_in(scope.conn()).await;
    scope.finish(result).await?;

    // =========================================================================
    // Load
    // =========================================================================

    let blogs: Vec<Arc<Blog>> = ctx
        .query_as::<Blog>("SELECT blog_id, name FROM blogs ORDER BY blog_id", vec![])
        .await?
        .into_iter()
        .map(Arc::new)
        .collect();

    let sc = ctx.scope_cache();
    for blog in &blogs {
        sc.add_object(blog.clone());
    }

    let pool = ctx.pool().clone();
    let loaders = IncludeLoaderList::new()
        .with(IncludeLoaderFn::new(move |later, sc, records| {
            let pool = pool.clone();
            Box::pin(async move {
                let mut found: Vec<Arc<dyn Entity>> = vec![];
                for blog in records.iter().filter_map(|r| downcast_arc::<Blog>(Arc::clone(r))) {
                    let posts: Vec<Post> = sqlx::query_as(
                        "SELECT post_id, blog_id, title FROM posts \
                         WHERE blog_id = ? ORDER BY post_id",
                    )
                    .bind(blog.blog_id)
                    .fetch_all(&pool)
                    .await
                    .map_err(Error::external)?;

                    for post in posts {
                        let post = Arc::new(post);
                        sc.add_object(post.clone());
                        blog.posts.push(post.clone());
                        found.push(post);
                    }
                }
                later.add_records(found);
                Ok(())
            })
        }))
        .with(IncludeLoaderFn::new(|_later, sc, records| {
            Box::pin(async move {
                for post in records.iter().filter_map(|r| downcast_arc::<Post>(Arc::clone(r))) {
                    let key = RowKey::new("blogs").with("blog_id", post.blog_id);
                    if let Some(blog) = sc
                        .get_object(Cardinality::ManyToOne, &key)
                        .and_then(|slot| slot.one().cloned())
                        .and_then(downcast_arc::<Blog>)
                    {
                        post.blog.set(blog);
                    }
                }
                Ok(())
            })
        }));

    let passes = ctx.include(
        blogs.iter().map(|b| b.clone() as Arc<dyn Entity>).collect(),
        &sc,
        &loaders,
    )
    .await?;
    info!(passes, cached = sc.len(), "blog graph loaded");

    for blog in &blogs {
        for post in blog.posts.get() {
            let owner = post.blog.get().map(|b| b.name.clone()).unwrap_or_default();
            info!(blog = %blog.name, post = %post.title, owner = %owner, "post");
        }
    }

    let mut dump = Vec::new();
    sc.dump(&mut dump)?;
    println!("{}", String::from_utf8_lossy(&dump));

    Ok(())
}
