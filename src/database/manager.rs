use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database unreachable after {attempts} attempts: {last_error}")]
    Unavailable { attempts: u32, last_error: String },

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Reachability probe consulted by the health endpoint.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health(&self) -> Result<(), DatabaseError>;
}

/// Owner of the process-wide connection pool. Cloning shares the pool.
#[derive(Clone, Debug)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// Open the pool and probe it until reachable or out of attempts.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let manager = Self::connect_lazy(config)?;

        let attempts = config.connect_attempts.max(1);
        let delay = Duration::from_secs(config.connect_retry_delay_secs);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let probe = tokio::time::timeout(delay.max(Duration::from_secs(1)), manager.health()).await;
            match probe.unwrap_or_else(|_| Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut))) {
                Ok(()) => {
                    info!(attempt, "Database connection established");
                    return Ok(manager);
                }
                Err(e) => {
                    warn!(attempt, max_attempts = attempts, "Database not reachable yet: {}", e);
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(DatabaseError::Unavailable { attempts, last_error })
    }

    /// Build the pool without touching the network.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = Self::pool_options(config).connect_lazy_with(Self::connect_options(config)?);
        Ok(Self { pool })
    }

    fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, DatabaseError> {
        let mut options = PgConnectOptions::from_str(&config.url)?;
        if let Some(search_path) = &config.search_path {
            options = options.options([("search_path", search_path.as_str())]);
        }
        Ok(options)
    }

    // sqlx has no idle-connection cap; `idle_timeout` reaps surplus idle
    // connections instead, so `max_idle_connections` is informational.
    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        let timezone = config.timezone.clone();
        PgPoolOptions::new()
            .max_connections(config.max_open_connections)
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .acquire_timeout(Duration::from_secs(config.connect_retry_delay_secs.max(1) * 5))
            // sqlx pins `TimeZone=UTC` in the startup packet, which wins over `-c` options
            .after_connect(move |conn, _meta| {
                let timezone = timezone.clone();
                Box::pin(async move {
                    sqlx::query("SELECT set_config('TimeZone', $1, false)")
                        .bind(timezone)
                        .execute(conn)
                        .await?;
                    Ok(())
                })
            })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Pings the pool to ensure connectivity
    pub async fn health(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Apply pending migrations from `migrations/`.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

#[async_trait]
impl HealthCheck for DatabaseManager {
    async fn health(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health(self).await
    }
}
