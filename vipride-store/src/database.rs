use sqlx::mysql::{MySqlConnectOptions, MySqlDatabaseError, MySqlPool, MySqlPoolOptions};
use sqlx::Connection;
use std::io::ErrorKind;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use vipride_core::{ConnectionFault, StoreError};

use crate::app_config::DatabaseConfig;

// MySQL server error numbers that mean the session is gone.
const ER_SERVER_SHUTDOWN: u16 = 1053;
const ER_CONNECTION_KILLED: u16 = 1927;

/// Classifies driver errors that mean the connection (or the whole pool) is unusable.
pub fn classify(err: &sqlx::Error) -> Option<ConnectionFault> {
    match err {
        sqlx::Error::Io(io) => match io.kind() {
            ErrorKind::ConnectionReset => Some(ConnectionFault::Reset),
            ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
            | ErrorKind::NotConnected => Some(ConnectionFault::Lost),
            _ => None,
        },
        sqlx::Error::PoolClosed => Some(ConnectionFault::EnqueueAfterFatal),
        sqlx::Error::WorkerCrashed => Some(ConnectionFault::Lost),
        sqlx::Error::Database(db) => match db.try_downcast_ref::<MySqlDatabaseError>().map(|e| e.number()) {
            Some(ER_SERVER_SHUTDOWN) | Some(ER_CONNECTION_KILLED) => Some(ConnectionFault::Lost),
            _ => None,
        },
        _ => None,
    }
}

pub fn to_store_error(err: &sqlx::Error) -> StoreError {
    match classify(err) {
        Some(fault) => StoreError::transient(fault, err.to_string()),
        None => StoreError::Query(err.to_string()),
    }
}

/// The pool to run a statement on, tagged with the rebuild generation it
/// belongs to. Errors are reported back with that generation so that
/// failures from a retired pool do not tear down its replacement.
#[derive(Clone)]
pub struct PoolHandle {
    pub generation: u64,
    pub pool: MySqlPool,
}

/// Owns the MySQL pool and replaces it when the connection dies.
///
/// The current pool sits behind an async `RwLock`: readers clone the handle
/// (a cheap `Arc` inside sqlx) and a rebuild swaps in a fully connected pool,
/// so nobody ever sees a half-built one. Work already running on the old pool
/// finishes there; the old pool is closed in the background.
pub struct DbClient {
    config: DatabaseConfig,
    current: RwLock<PoolHandle>,
    generation: AtomicU64,
    rebuilding: AtomicBool,
    rebuild_attempts: AtomicU64,
}

impl DbClient {
    pub async fn connect(config: DatabaseConfig) -> Result<Arc<Self>, sqlx::Error> {
        let pool = Self::build_pool(&config).await?;
        info!(
            max_connections = config.max_connections,
            connect_timeout_seconds = config.connect_timeout_seconds,
            "MySQL pool ready"
        );
        Ok(Self::from_pool(config, pool))
    }

    fn from_pool(config: DatabaseConfig, pool: MySqlPool) -> Arc<Self> {
        Arc::new(Self {
            config,
            current: RwLock::new(PoolHandle { generation: 0, pool }),
            generation: AtomicU64::new(0),
            rebuilding: AtomicBool::new(false),
            rebuild_attempts: AtomicU64::new(0),
        })
    }

    fn pool_options(config: &DatabaseConfig) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .max_lifetime(Duration::from_secs(config.max_lifetime_seconds))
            .test_before_acquire(true)
    }

    async fn build_pool(config: &DatabaseConfig) -> Result<MySqlPool, sqlx::Error> {
        let options = MySqlConnectOptions::from_str(&config.url)?;
        Self::pool_options(config).connect_with(options).await
    }

    /// The pool to use for the next statement.
    pub async fn pool(&self) -> PoolHandle {
        self.current.read().await.clone()
    }

    /// Number of successful pool rebuilds, which is also the current generation.
    pub fn rebuild_count(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool().await.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Acquires one connection, pings it and hands it back.
    pub async fn health_check(self: &Arc<Self>) -> bool {
        let current = self.pool().await;
        let result = match current.pool.acquire().await {
            Ok(mut conn) => conn.ping().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, generation = current.generation, "Database health check failed");
                self.observe(current.generation, &e);
                false
            }
        }
    }

    /// Runs the health check on a fixed interval for the life of the process.
    pub fn spawn_health_check(self: &Arc<Self>) -> JoinHandle<()> {
        let client = Arc::clone(self);
        let period = Duration::from_secs(self.config.health_check_interval_seconds.max(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick fires immediately; the pool was just verified by connect().
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if client.health_check().await {
                    debug!("Database health check passed");
                }
            }
        })
    }

    /// Converts a driver error raised on pool `generation` and starts a
    /// rebuild when the error means that pool is gone.
    ///
    /// Errors from a pool that has already been replaced never trigger a
    /// rebuild. A `PoolClosed` from such a pool only means the statement lost
    /// its connection in the swap, so it is reported as retryable.
    pub fn observe(self: &Arc<Self>, generation: u64, err: &sqlx::Error) -> StoreError {
        let current = self.generation.load(Ordering::SeqCst);
        match classify(err) {
            Some(fault) if generation == current => self.trigger_rebuild(fault),
            Some(fault) => {
                debug!(%fault, generation, current, "Error from a retired pool, not rebuilding");
                if fault == ConnectionFault::EnqueueAfterFatal {
                    return StoreError::transient(ConnectionFault::Lost, err.to_string());
                }
            }
            None => debug!(error = %err, "Database error does not affect the pool"),
        }
        to_store_error(err)
    }

    fn trigger_rebuild(self: &Arc<Self>, fault: ConnectionFault) {
        if self.rebuilding.swap(true, Ordering::SeqCst) {
            debug!(%fault, "Pool rebuild already in progress");
            return;
        }

        let client = Arc::clone(self);
        tokio::spawn(async move {
            client.rebuild(fault).await;
            client.rebuilding.store(false, Ordering::SeqCst);
        });
    }

    async fn rebuild(&self, fault: ConnectionFault) {
        let attempt = self.rebuild_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        warn!(%fault, attempt, "Fatal database connection error, recreating pool");

        match Self::build_pool(&self.config).await {
            Ok(fresh) => {
                let (generation, old) = self.install(fresh).await;
                info!(generation, "Database pool recreated");

                // Teardown is best effort; close() waits for borrowed connections.
                tokio::spawn(async move {
                    old.close().await;
                    debug!("Previous database pool closed");
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to recreate database pool, keeping the previous one");
            }
        }
    }

    /// Swaps `fresh` in as the next generation and returns it with the retired pool.
    async fn install(&self, fresh: MySqlPool) -> (u64, MySqlPool) {
        let mut current = self.current.write().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let old = std::mem::replace(&mut *current, PoolHandle { generation, pool: fresh });
        (generation, old.pool)
    }
}
