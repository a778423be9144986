//! Database access layer: pool handle, retry wrapper, models, repositories.
//!
//! The [`Db`] handle owns the process-wide connection pool and is the only
//! thing handlers receive (via `AppState`). Its lifecycle is explicit:
//! created once at startup with [`Db::connect`], closed on shutdown with
//! [`Db::close`]. When the retry wrapper exhausts its budget on a transient
//! error, the handle rebuilds the pool in place -- see [`retry`].

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::RwLock;

pub mod models;
pub mod repositories;
pub mod retry;

pub use retry::RetryConfig;

pub type DbPool = sqlx::PgPool;

/// Default pool size.
const MAX_CONNECTIONS: u32 = 20;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Clamp a caller-supplied page number to `>= 1`.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

/// Clamp a caller-supplied page size to `1..=100` (default 10).
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(10).clamp(1, 100)
}

struct DbInner {
    url: String,
    pool: RwLock<DbPool>,
    retry: RetryConfig,
    reconnects: AtomicU32,
}

/// Shared database handle: a rebuildable pool plus the retry policy.
///
/// Cheap to clone (everything is behind one `Arc`). A pool rebuild swaps the
/// pool under all clones at once, so in-flight callers sharing the handle see
/// the replacement too.
#[derive(Clone)]
pub struct Db {
    inner: Arc<DbInner>,
}

impl Db {
    /// Connect to the database and wrap the pool in a handle.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = create_pool(database_url).await?;
        Ok(Self::from_pool(pool, database_url))
    }

    /// Wrap an existing pool (used by tests that get their pool from the
    /// `#[sqlx::test]` harness).
    pub fn from_pool(pool: DbPool, database_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(DbInner {
                url: database_url.into(),
                pool: RwLock::new(pool),
                retry: RetryConfig::default(),
                reconnects: AtomicU32::new(0),
            }),
        }
    }

    /// Override the retry policy (tests use a short base delay).
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        let inner = Arc::get_mut(&mut self.inner)
            .expect("with_retry_config must be called before the handle is cloned");
        inner.retry = retry;
        self
    }

    /// A clone of the current pool. Repositories take `&PgPool`, so most
    /// call sites are `&db.pool().await`.
    pub async fn pool(&self) -> DbPool {
        self.inner.pool.read().await.clone()
    }

    /// Run a data-access operation under the transient-error retry policy.
    ///
    /// Returns `Ok(Some(value))` on success, `Ok(None)` when the retry
    /// budget was exhausted on a transient error (the pool has been rebuilt
    /// by then), and `Err` immediately for any non-transient error.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<Option<T>, sqlx::Error>
    where
        F: Fn(DbPool) -> Fut,
        Fut: std::future::Future<Output = Result<T, sqlx::Error>>,
    {
        let pool = self.pool().await;
        match retry::run_with_retry(&self.inner.retry, || op(pool.clone())).await? {
            Some(value) => Ok(Some(value)),
            None => {
                self.rebuild_pool().await;
                Ok(None)
            }
        }
    }

    /// How many times the pool has been force-rebuilt.
    pub fn reconnect_count(&self) -> u32 {
        self.inner.reconnects.load(Ordering::Relaxed)
    }

    /// Replace the pool with a fresh one and close the old pool.
    ///
    /// Connecting happens before the swap so a failed rebuild keeps the
    /// existing pool in place rather than leaving the handle dead.
    async fn rebuild_pool(&self) {
        self.inner.reconnects.fetch_add(1, Ordering::Relaxed);
        match create_pool(&self.inner.url).await {
            Ok(new_pool) => {
                let old = {
                    let mut guard = self.inner.pool.write().await;
                    std::mem::replace(&mut *guard, new_pool)
                };
                old.close().await;
                tracing::warn!("Database pool rebuilt after exhausted retry budget");
            }
            Err(e) => {
                tracing::error!(error = %e, "Pool rebuild failed, keeping existing pool");
            }
        }
    }

    /// Close the pool. Called once during graceful shutdown.
    pub async fn close(&self) {
        self.inner.pool.read().await.close().await;
    }
}
