//! Transaction scopes.
//!
//! A scope commits when the work it wraps succeeds and rolls back when it
//! fails. Dropping a scope without finishing it rolls back as well.

use std::fmt;

use sqlpatch_core::include::BoxFuture;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, warn};

use crate::error::Result;

/// An open transaction that is committed or rolled back by [`finish`].
///
/// [`finish`]: TxScope::finish
///
/// # Example
///
/// ```rust,no_run
/// use sqlpatch_orm::{DbContext, TxScope};
///
/// # async fn run(ctx: &mut DbContext) -> sqlpatch_orm::Result<()> {
/// let mut scope = TxScope::begin(ctx.pool()).await?;
/// let result = ctx.save_changes_in(scope.conn()).await;
/// scope.finish(result).await
/// # }
/// ```
pub struct TxScope {
    tx: Transaction<'static, Sqlite>,
}

impl TxScope {
    /// Begins a transaction on a pooled connection.
    ///
    /// # Errors
    ///
    /// Returns the driver error when no connection can be acquired or
    /// `BEGIN` fails.
    pub async fn begin(pool: &SqlitePool) -> Result<Self> {
        let tx = pool.begin().await?;
        debug!("transaction started");
        Ok(Self { tx })
    }

    /// Returns the transaction's connection.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    /// Commits when `result` is `Ok`, rolls back otherwise, and hands
    /// `result` back.
    ///
    /// # Errors
    ///
    /// Returns `result`'s error unchanged after a rollback, or the commit
    /// error. A failed rollback is logged, not returned.
    pub async fn finish<T>(self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.tx.commit().await?;
                debug!("transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.tx.rollback().await {
                    warn!(error = %rollback_err, "rollback failed");
                } else {
                    debug!(error = %err, "transaction rolled back");
                }
                Err(err)
            }
        }
    }
}

impl fmt::Debug for TxScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxScope").finish_non_exhaustive()
    }
}

/// Runs `f` inside a transaction: commits on `Ok`, rolls back on `Err`.
///
/// # Example
///
/// ```rust,no_run
/// use sqlpatch_orm::tx_scope;
/// use sqlx::SqlitePool;
///
/// # async fn run(pool: &SqlitePool) -> sqlpatch_orm::Result<()> {
/// tx_scope(pool, |conn| {
///     Box::pin(async move {
///         sqlx::query("DELETE FROM posts").execute(&mut *conn).await?;
///         sqlx::query("DELETE FROM blogs").execute(&mut *conn).await?;
///         Ok(())
///     })
/// })
/// .await
/// # }
/// ```
///
/// # Errors
///
/// Returns the error of `f` unchanged, or the driver error of
/// `BEGIN`/`COMMIT`.
pub async fn tx_scope<T, F>(pool: &SqlitePool, f: F) -> Result<T>
where
    F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T>>,
{
    let mut scope = TxScope::begin(pool).await?;
    let result = f(scope.conn()).await;
    scope.finish(result).await
}
