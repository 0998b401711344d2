//! The execution context.

use std::fmt;
use std::sync::Arc;

use sqlpatch_core::builder::{SqlValue, Statement};
use sqlpatch_core::compiler::{CompilerHook, CompilerOptions, PatchCompiler};
use sqlpatch_core::dialect::{Dialect, DialectRegistry};
use sqlpatch_core::include::{include, IncludeLoader};
use sqlpatch_core::schema::Entity;
use sqlpatch_core::{Cancel, MetaSchema, Patch, ScopeCache};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::config::ContextConfig;
use crate::error::Result;
use crate::scan::{bind_param, bind_param_as, scan_rows, ScannedRow};

/// Buffers patches, compiles them with the configured strategy and runs
/// the statements against a SQLite pool.
///
/// # Example
///
/// ```rust,no_run
/// use sqlpatch_core::builder::SqlValue;
/// use sqlpatch_core::Patch;
/// use sqlpatch_orm::{ContextConfig, DbContext};
/// use sqlx::SqlitePool;
///
/// # async fn run(pool: SqlitePool) -> sqlpatch_orm::Result<()> {
/// let mut ctx = DbContext::sqlite(pool).with_config(ContextConfig {
///     bulk: true,
///     ..ContextConfig::default()
/// });
///
/// ctx.patch(Patch::insert("testing", ["id"], vec![SqlValue::Int(1)]));
/// ctx.patch(Patch::insert("testing", ["id"], vec![SqlValue::Int(2)]));
/// ctx.save_changes().await?; // one INSERT with two rows
/// # Ok(())
/// # }
/// ```
pub struct DbContext {
    pool: SqlitePool,
    dialect: Arc<dyn Dialect>,
    meta: Arc<MetaSchema>,
    config: ContextConfig,
    compiler: Option<Arc<dyn PatchCompiler>>,
    hook: Option<Arc<dyn CompilerHook>>,
    patches: Vec<Patch>,
}

impl DbContext {
    /// Creates a context using the dialect registered under `dialect_name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDialect`](sqlpatch_core::Error::UnknownDialect)
    /// if `registry` has no such dialect.
    pub fn new(registry: &DialectRegistry, dialect_name: &str, pool: SqlitePool) -> Result<Self> {
        let dialect = registry.get(dialect_name)?;
        Ok(Self::with_dialect(dialect, pool))
    }

    /// Creates a context using the SQLite dialect.
    #[must_use]
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self::with_dialect(Arc::new(sqlpatch_sqlite::SqliteDialect::new()), pool)
    }

    fn with_dialect(dialect: Arc<dyn Dialect>, pool: SqlitePool) -> Self {
        Self {
            pool,
            dialect,
            meta: Arc::new(MetaSchema::new()),
            config: ContextConfig::default(),
            compiler: None,
            hook: None,
            patches: vec![],
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the compiler selected by the configuration.
    #[must_use]
    pub fn with_compiler(mut self, compiler: impl PatchCompiler + 'static) -> Self {
        self.compiler = Some(Arc::new(compiler));
        self
    }

    /// Sets the hook applied to every compiled statement.
    #[must_use]
    pub fn with_hook(mut self, hook: impl CompilerHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Sets the schema used by the entity helpers and scope caches.
    #[must_use]
    pub fn with_meta(mut self, meta: Arc<MetaSchema>) -> Self {
        self.meta = meta;
        self
    }

    /// Returns the pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Returns the schema.
    #[must_use]
    pub const fn meta(&self) -> &Arc<MetaSchema> {
        &self.meta
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Returns a fresh scope cache over this context's schema.
    #[must_use]
    pub fn scope_cache(&self) -> ScopeCache {
        ScopeCache::new(Arc::clone(&self.meta))
    }

    // =========================================================================
    // Patch buffer
    // =========================================================================

    /// Buffers a patch until the next save.
    pub fn patch(&mut self, patch: Patch) {
        self.patches.push(patch);
    }

    /// Buffers an insert of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if the entity type is not registered in the schema.
    pub fn insert(&mut self, entity: &dyn Entity) {
        let patch = self.meta.insert_patch_of(entity);
        self.patch(patch);
    }

    /// Buffers an update of `entity`, keyed by its primary key.
    ///
    /// # Panics
    ///
    /// Panics if the entity type is not registered in the schema.
    pub fn update(&mut self, entity: &dyn Entity) {
        let patch = self.meta.update_patch_of(entity);
        self.patch(patch);
    }

    /// Buffers a delete of `entity`, keyed by its primary key.
    ///
    /// # Panics
    ///
    /// Panics if the entity type is not registered in the schema.
    pub fn delete(&mut self, entity: &dyn Entity) {
        let patch = self.meta.delete_patch_of(entity);
        self.patch(patch);
    }

    /// Returns the buffered patches.
    #[must_use]
    pub fn pending(&self) -> &[Patch] {
        &self.patches
    }

    /// Drains the buffer and compiles it.
    ///
    /// # Panics
    ///
    /// Panics if a buffered patch has different numbers of columns and
    /// values.
    pub fn compile_patch(&mut self) -> Vec<Box<dyn Statement>> {
        let patches = std::mem::take(&mut self.patches);
        let compiler = self
            .compiler
            .clone()
            .unwrap_or_else(|| self.config.compiler());

        let mut opts = CompilerOptions::new(self.dialect.as_ref(), &patches);
        if let Some(hook) = &self.hook {
            opts = opts.hook(hook.as_ref());
        }
        compiler.compile(&opts)
    }

    // =========================================================================
    // Saving
    // =========================================================================

    /// Compiles the buffer and runs every statement on one pooled
    /// connection.
    ///
    /// # Errors
    ///
    /// Returns the first render or driver error; later statements are not
    /// run. The buffer is drained either way.
    pub async fn save_changes(&mut self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        self.run(&mut conn, None, false).await.map(drop)
    }

    /// Like [`save_changes`](Self::save_changes), checking `cancel` before
    /// each statement.
    ///
    /// # Errors
    ///
    /// Also returns [`Error::Cancelled`](sqlpatch_core::Error::Cancelled)
    /// once `cancel` fires.
    pub async fn save_changes_with_cancel(&mut self, cancel: &Cancel) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        self.run(&mut conn, Some(cancel), false).await.map(drop)
    }

    /// Like [`save_changes`](Self::save_changes), on a caller-supplied
    /// connection or transaction.
    ///
    /// # Errors
    ///
    /// Returns the first render or driver error.
    pub async fn save_changes_in(&mut self, conn: &mut SqliteConnection) -> Result<()> {
        self.run(conn, None, false).await.map(drop)
    }

    /// Like [`save_changes`](Self::save_changes), collecting the rows the
    /// statements return (see `ReturningHook`).
    ///
    /// # Errors
    ///
    /// Returns the first render, driver or decode error.
    pub async fn save_changes_returning(&mut self) -> Result<Vec<ScannedRow>> {
        let mut conn = self.pool.acquire().await?;
        self.run(&mut conn, None, true).await
    }

    async fn run(
        &mut self,
        conn: &mut SqliteConnection,
        cancel: Option<&Cancel>,
        returning: bool,
    ) -> Result<Vec<ScannedRow>> {
        let stmts = self.compile_patch();
        let mut returned = vec![];

        for stmt in &stmts {
            if let Some(cancel) = cancel {
                cancel.check()?;
            }
            let (sql, params) = stmt.build()?;
            self.log_statement(&sql, &params);

            let query = params.into_iter().fold(sqlx::query(&sql), bind_param);
            if returning {
                let rows = query.fetch_all(&mut *conn).await?;
                returned.extend(scan_rows(self.dialect.as_ref(), &rows)?);
            } else {
                query.execute(&mut *conn).await?;
            }
        }

        debug!(statements = stmts.len(), "changes saved");
        Ok(returned)
    }

    fn log_statement(&self, sql: &str, params: &[SqlValue]) {
        if self.config.debug {
            info!(sql = %sql, params = ?params, "executing statement");
        } else {
            debug!(sql = %sql, params = ?params, "executing statement");
        }
    }

    // =========================================================================
    // Querying
    // =========================================================================

    /// Runs a query and returns the raw rows.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    pub async fn query(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<SqliteRow>> {
        self.log_statement(sql, &params);
        let query = params.into_iter().fold(sqlx::query(sql), bind_param);
        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Runs a query and decodes the rows without a target type.
    ///
    /// # Errors
    ///
    /// Returns the driver or decode error.
    pub async fn fetch(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<ScannedRow>> {
        let rows = self.query(sql, params).await?;
        self.scan_rows(&rows)
    }

    /// Decodes rows through the dialect's scan-type mapping.
    ///
    /// # Errors
    ///
    /// Returns the decode error.
    pub fn scan_rows(&self, rows: &[SqliteRow]) -> Result<Vec<ScannedRow>> {
        scan_rows(self.dialect.as_ref(), rows)
    }

    /// Runs a query and decodes each row into `T`.
    ///
    /// # Errors
    ///
    /// Returns the driver or decode error.
    pub async fn query_as<T>(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        self.log_statement(sql, &params);
        let query = params
            .into_iter()
            .fold(sqlx::query_as::<_, T>(sql), bind_param_as);
        Ok(query.fetch_all(&self.pool).await?)
    }

    // =========================================================================
    // Associations
    // =========================================================================

    /// Loads the associations of `records` breadth first, up to the
    /// configured `max_include_depth`. Returns the number of passes.
    ///
    /// # Errors
    ///
    /// Returns the first loader error unchanged.
    pub async fn include(
        &self,
        records: Vec<Arc<dyn Entity>>,
        sc: &ScopeCache,
        loader: &dyn IncludeLoader,
    ) -> Result<usize> {
        Ok(include(records, sc, loader, self.config.max_include_depth, None).await?)
    }

    /// Like [`include`](Self::include), checking `cancel` before each
    /// loader call.
    ///
    /// # Errors
    ///
    /// Returns the first loader error unchanged, or
    /// [`Error::Cancelled`](sqlpatch_core::Error::Cancelled).
    pub async fn include_with_cancel(
        &self,
        records: Vec<Arc<dyn Entity>>,
        sc: &ScopeCache,
        loader: &dyn IncludeLoader,
        cancel: &Cancel,
    ) -> Result<usize> {
        Ok(include(
            records,
            sc,
            loader,
            self.config.max_include_depth,
            Some(cancel),
        )
        .await?)
    }
}

impl fmt::Debug for DbContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbContext")
            .field("dialect", &self.dialect.name())
            .field("config", &self.config)
            .field("pending", &self.patches.len())
            .finish_non_exhaustive()
    }
}
