//! # Database Handle
//!
//! Connection pool creation, migrations, and the [`Database`] handle that
//! hands out repositories sharing one store and one query cache.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DbConfig::new(path) ← pool sizes, timeouts, staleness window           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await                                            │
//! │       ├── open SqlitePool (file created if missing)                     │
//! │       ├── run embedded migrations                                       │
//! │       └── write store version tag (first open only)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────────────────────────┐                      │
//! │  │ Database                                      │                      │
//! │  │   store: DocumentStore ──┐                    │                      │
//! │  │   cache: QueryCache ─────┼──► products()      │                      │
//! │  │                          ├──► customers()     │                      │
//! │  │                          └──► invoices()      │                      │
//! │  └───────────────────────────────────────────────┘                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Local, TimeZone};
use khata_core::dashboard::DashboardSummary;
use khata_core::LOW_STOCK_THRESHOLD;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::cache::QueryCache;
use crate::config::CacheConfig;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::customer::CustomerRepository;
use crate::repository::invoice::InvoiceRepository;
use crate::repository::product::ProductRepository;
use crate::store::DocumentStore;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/khata.db")
///     .max_connections(2)
///     .staleness_window(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection. `None` keeps connections.
    /// Default: 10 minutes
    pub idle_timeout: Option<Duration>,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,

    /// Query cache settings.
    pub cache: CacheConfig,
}

impl DbConfig {
    /// Creates a configuration for the given file. It is created if missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            run_migrations: true,
            cache: CacheConfig::default(),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Sets how long listings are served from the query cache.
    pub fn staleness_window(mut self, window: Duration) -> Self {
        self.cache.staleness_window = window;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// One connection that is never reaped: the data lives only as long as
    /// that connection does.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            run_migrations: true,
            cache: CacheConfig::default(),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cloning shares the pool and the cache, so a write through one clone is
/// seen by the next read through any other.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    store: DocumentStore,
    cache: QueryCache,
}

impl Database {
    /// Opens (or creates) the store and readies it for use.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. WAL mode and NORMAL synchronous for file-backed stores
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled) and writes the version tag
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_options = if config.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::StorageUnavailable(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.database_path)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .create_if_missing(true)
        };

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(if config.is_in_memory() {
                None
            } else {
                Some(Duration::from_secs(30 * 60))
            })
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::StorageUnavailable(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            store: DocumentStore::new(pool.clone()),
            cache: QueryCache::new(&config.cache),
            pool,
        };

        if config.run_migrations {
            db.run_migrations().await?;
            db.store.init_version().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The raw document store. Writes through it bypass cache invalidation.
    pub fn store(&self) -> DocumentStore {
        self.store.clone()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Returns the product repository.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let products = db.products().list().await?;
    /// ```
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.store.clone(), self.cache.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.store.clone(), self.cache.clone())
    }

    pub fn invoices(&self) -> InvoiceRepository {
        InvoiceRepository::new(self.store.clone(), self.cache.clone())
    }

    /// Dashboard rollups for the local calendar day, with invoice dates
    /// read in the machine's time zone.
    pub async fn dashboard(&self) -> DbResult<DashboardSummary> {
        self.dashboard_for(&Local::now(), LOW_STOCK_THRESHOLD).await
    }

    /// Dashboard rollups as of `now`, from cache-aware listings.
    ///
    /// The zone of `now` decides which invoices count as today's and which
    /// month each one falls in.
    pub async fn dashboard_for<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        low_stock_threshold: i64,
    ) -> DbResult<DashboardSummary> {
        let products = self.products().list().await?;
        let customers = self.customers().list().await?;
        let invoices = self.invoices().list().await?;

        Ok(DashboardSummary::compute_with_threshold(
            &products,
            &customers,
            &invoices,
            now,
            low_stock_threshold,
        ))
    }

    /// Closes the pool. Every later operation fails with
    /// [`DbError::StorageUnavailable`].
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database can execute queries.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Namespace, STORE_VERSION};

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        assert_eq!(
            db.store().version().await.unwrap().as_deref(),
            Some(STORE_VERSION)
        );

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_separate_in_memory_databases_are_isolated() {
        let a = Database::new(DbConfig::in_memory()).await.unwrap();
        let b = Database::new(DbConfig::in_memory()).await.unwrap();

        a.store()
            .put(Namespace::Invoices, "only-in-a", &1)
            .await
            .unwrap();
        assert_eq!(b.store().count(Namespace::Invoices).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_closed_pool_is_storage_unavailable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        assert!(!db.health_check().await);
        let err = db.store().count(Namespace::Products).await.unwrap_err();
        assert!(err.is_storage_unavailable());
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .staleness_window(Duration::from_secs(5));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.cache.staleness_window, Duration::from_secs(5));
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
