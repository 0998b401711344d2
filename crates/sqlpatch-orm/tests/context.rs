//! Saving, querying and scanning through the execution context.

mod common;

use chrono::NaiveDate;
use common::{blog, count, create_test_context, create_test_pool, post, Post};
use sqlpatch_core::builder::SqlValue;
use sqlpatch_core::dialect::DialectRegistry;
use sqlpatch_core::{Cancel, Patch, RowKey};
use sqlpatch_orm::{tx_scope, ContextConfig, DbContext, OrmError, TxScope};
use sqlpatch_sqlite::ReturningHook;

fn testing_insert(id: i64, name: &str) -> Patch {
    Patch::insert(
        "testing",
        ["id", "name"],
        vec![SqlValue::Int(id), SqlValue::Text(name.to_string())],
    )
}

// =============================================================================
// Construction
// =============================================================================

#[tokio::test]
async fn test_dialect_is_resolved_from_the_registry() {
    let pool = create_test_pool().await;

    let err = DbContext::new(&DialectRegistry::with_defaults(), "sqlite3", pool.clone())
        .unwrap_err();
    assert!(matches!(
        err,
        OrmError::Core(sqlpatch_core::Error::UnknownDialect(ref name)) if name == "sqlite3"
    ));

    let mut registry = DialectRegistry::with_defaults();
    sqlpatch_sqlite::register(&mut registry);
    let ctx = DbContext::new(&registry, "sqlite3", pool).unwrap();
    assert_eq!(ctx.dialect().name(), "sqlite3");
}

// =============================================================================
// Saving
// =============================================================================

#[tokio::test]
async fn test_save_changes_runs_buffered_patches() {
    let mut ctx = create_test_context().await;

    ctx.insert(&blog(1, "news"));
    ctx.insert(&post(1, 1, "hello"));
    ctx.insert(&post(2, 1, "world"));
    assert_eq!(ctx.pending().len(), 3);

    ctx.save_changes().await.unwrap();

    assert!(ctx.pending().is_empty());
    assert_eq!(count(&ctx, "blogs").await, 1);
    assert_eq!(count(&ctx, "posts").await, 2);
}

#[tokio::test]
async fn test_omitted_empty_column_takes_the_database_default() {
    let mut ctx = create_test_context().await;

    ctx.insert(&post(1, 1, ""));
    ctx.save_changes().await.unwrap();

    let rows = ctx
        .fetch("SELECT title FROM posts WHERE post_id = ?", vec![SqlValue::Int(1)])
        .await
        .unwrap();
    assert_eq!(
        rows[0].get("title"),
        Some(&SqlValue::Text(String::from("untitled")))
    );
}

#[tokio::test]
async fn test_update_and_delete_entities() {
    let mut ctx = create_test_context().await;

    ctx.insert(&blog(1, "news"));
    ctx.insert(&blog(2, "sports"));
    ctx.save_changes().await.unwrap();

    ctx.update(&blog(1, "breaking news"));
    ctx.delete(&blog(2, ""));
    ctx.save_changes().await.unwrap();

    let rows = ctx
        .fetch("SELECT blog_id, name FROM blogs ORDER BY blog_id", vec![])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("name"),
        Some(&SqlValue::Text(String::from("breaking news")))
    );
}

#[tokio::test]
async fn test_bulk_config_merges_statements() {
    let mut ctx = create_test_context().await.with_config(ContextConfig {
        bulk: true,
        max_patches: 2,
        ..ContextConfig::default()
    });

    for id in 1..=5 {
        ctx.patch(testing_insert(id, "n"));
    }
    let stmts = ctx.compile_patch();
    assert_eq!(stmts.len(), 3);
    assert!(ctx.pending().is_empty());

    for id in 1..=5 {
        ctx.patch(testing_insert(id, "n"));
    }
    ctx.save_changes().await.unwrap();
    assert_eq!(count(&ctx, "testing").await, 5);
}

#[tokio::test]
async fn test_wildcard_delete_clears_the_table() {
    let mut ctx = create_test_context().await;
    ctx.patch(testing_insert(1, "a"));
    ctx.patch(testing_insert(2, "b"));
    ctx.patch(Patch::delete("testing", None));
    ctx.save_changes().await.unwrap();

    assert_eq!(count(&ctx, "testing").await, 0);
}

#[tokio::test]
async fn test_first_error_halts_the_batch() {
    let mut ctx = create_test_context().await;

    ctx.patch(testing_insert(1, "a"));
    ctx.patch(testing_insert(1, "duplicate"));
    ctx.patch(testing_insert(2, "b"));

    let err = ctx.save_changes().await.unwrap_err();
    assert!(matches!(err, OrmError::Database(_)));

    // No transaction: the first insert stays, the third never ran.
    assert!(ctx.pending().is_empty());
    assert_eq!(count(&ctx, "testing").await, 1);
}

#[tokio::test]
async fn test_cancelled_save_runs_nothing() {
    let mut ctx = create_test_context().await;
    let cancel = Cancel::new();
    cancel.cancel();

    ctx.patch(testing_insert(1, "a"));
    let err = ctx.save_changes_with_cancel(&cancel).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(count(&ctx, "testing").await, 0);
}

#[tokio::test]
async fn test_returning_hook_yields_affected_rows() {
    let mut ctx = create_test_context()
        .await
        .with_config(ContextConfig {
            bulk: true,
            ..ContextConfig::default()
        })
        .with_hook(ReturningHook::columns(["id"]));

    ctx.patch(testing_insert(1, "a"));
    ctx.patch(testing_insert(2, "b"));
    ctx.patch(Patch::update(
        "testing",
        Some(RowKey::new("testing").with("id", 2_i64)),
        ["name"],
        vec![SqlValue::Text(String::from("c"))],
    ));

    let rows = ctx.save_changes_returning().await.unwrap();
    let ids: Vec<Option<&SqlValue>> = rows.iter().map(|row| row.get("id")).collect();
    assert_eq!(
        ids,
        vec![
            Some(&SqlValue::Int(1)),
            Some(&SqlValue::Int(2)),
            Some(&SqlValue::Int(2)),
        ]
    );
}

// =============================================================================
// Transactions
// =============================================================================

#[tokio::test]
async fn test_tx_scope_rolls_back_on_error() {
    let mut ctx = create_test_context().await;

    ctx.patch(testing_insert(1, "a"));
    ctx.patch(testing_insert(1, "duplicate"));

    let mut scope = TxScope::begin(ctx.pool()).await.unwrap();
    let result = ctx.save_changes_in(scope.conn()).await;
    let err = scope.finish(result).await.unwrap_err();

    assert!(matches!(err, OrmError::Database(_)));
    assert_eq!(count(&ctx, "testing").await, 0);
}

#[tokio::test]
async fn test_tx_scope_commits_on_success() {
    let mut ctx = create_test_context().await;

    ctx.patch(testing_insert(1, "a"));
    ctx.patch(testing_insert(2, "b"));

    let mut scope = TxScope::begin(ctx.pool()).await.unwrap();
    let result = ctx.save_changes_in(scope.conn()).await;
    scope.finish(result).await.unwrap();

    assert_eq!(count(&ctx, "testing").await, 2);
}

#[tokio::test]
async fn test_tx_scope_closure() {
    let ctx = create_test_context().await;

    tx_scope(ctx.pool(), |conn| {
        Box::pin(async move {
            sqlx::query("INSERT INTO testing (id, name) VALUES (1, 'a')")
                .execute(&mut *conn)
                .await?;
            Ok(())
        })
    })
    .await
    .unwrap();
    assert_eq!(count(&ctx, "testing").await, 1);

    let err = tx_scope(ctx.pool(), |conn| {
        Box::pin(async move {
            sqlx::query("INSERT INTO testing (id, name) VALUES (2, 'b')")
                .execute(&mut *conn)
                .await?;
            sqlx::query("INSERT INTO missing_table VALUES (1)")
                .execute(&mut *conn)
                .await?;
            Ok(())
        })
    })
    .await
    .unwrap_err();

    assert!(matches!(err, OrmError::Database(_)));
    assert_eq!(count(&ctx, "testing").await, 1);
}

// =============================================================================
// Querying
// =============================================================================

#[tokio::test]
async fn test_scan_rows_by_declared_type() {
    let ctx = create_test_context().await;
    sqlx::query(
        "CREATE TABLE samples (
            i INTEGER, r REAL, t TEXT, b BLOB, flag BOOLEAN, missing TEXT
        )",
    )
    .execute(ctx.pool())
    .await
    .unwrap();
    sqlx::query("INSERT INTO samples VALUES (42, 1.5, 'text', x'00ff', 1, NULL)")
        .execute(ctx.pool())
        .await
        .unwrap();

    let rows = ctx.fetch("SELECT * FROM samples", vec![]).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].column_names().collect::<Vec<_>>(),
        vec!["i", "r", "t", "b", "flag", "missing"]
    );
    assert_eq!(
        rows[0].clone().into_values(),
        vec![
            SqlValue::Int(42),
            SqlValue::Float(1.5),
            SqlValue::Text(String::from("text")),
            SqlValue::Blob(vec![0x00, 0xff]),
            SqlValue::Bool(true),
            SqlValue::Null,
        ]
    );
}

#[tokio::test]
async fn test_scan_expression_columns() {
    let ctx = create_test_context().await;
    let rows = ctx
        .fetch("SELECT COUNT(*) AS n FROM blogs", vec![])
        .await
        .unwrap();
    assert_eq!(rows[0].get("n"), Some(&SqlValue::Int(0)));
}

#[tokio::test]
async fn test_query_binds_every_value_kind() {
    let ctx = create_test_context().await;
    let rows = ctx
        .fetch(
            "SELECT ? AS a, ? AS b, ? AS c, ? AS d",
            vec![
                SqlValue::Int(7),
                SqlValue::Text(String::from("x")),
                SqlValue::Blob(vec![1, 2]),
                SqlValue::Null,
            ],
        )
        .await
        .unwrap();

    assert_eq!(rows[0].get("a"), Some(&SqlValue::Int(7)));
    assert_eq!(rows[0].get("b"), Some(&SqlValue::Text(String::from("x"))));
    assert_eq!(rows[0].get("c"), Some(&SqlValue::Blob(vec![1, 2])));
    assert_eq!(rows[0].get("d"), Some(&SqlValue::Null));
}

#[tokio::test]
async fn test_query_as_entities() {
    let mut ctx = create_test_context().await;
    let published = NaiveDate::from_ymd_opt(2024, 1, 2)
        .and_then(|d| d.and_hms_opt(10, 30, 0))
        .unwrap();

    ctx.insert(&Post {
        published_at: Some(published),
        ..post(1, 1, "hello")
    });
    ctx.insert(&post(2, 1, "world"));
    ctx.save_changes().await.unwrap();

    let posts: Vec<Post> = ctx
        .query_as(
            "SELECT post_id, blog_id, title, published_at FROM posts \
             WHERE blog_id = ? ORDER BY post_id",
            vec![SqlValue::Int(1)],
        )
        .await
        .unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].title, "hello");
    assert_eq!(posts[0].published_at, Some(published));
    assert_eq!(posts[1].published_at, None);
    assert!(!posts[0].blog.is_set());
}
