//! Persistence Layer
//!
//! SQLite implementations of the engine's collaborators, via sqlx.
//!
//! # Database Schema
//!
//! ## transactions
//! Append-only feed written by an external producer. `transaction_id` is the
//! monotonically increasing cursor key.
//!
//! ## client_exposures / symbol_exposures
//! Keyed aggregates (`client_id` / `symbol`) with `total_exposure`, a row
//! count and `risk_level`. Totals belong to the writer, `risk_level` to the
//! engine.
//!
//! ## alerts
//! One row per emitted alert, with acknowledgment columns for operators.
//!
//! ## risk_metrics
//! Append-only metrics snapshots.

pub mod alert_repository;
pub mod exposure_repository;
pub mod metrics_repository;
pub mod models;
pub mod transaction_repository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::config::{env_flag, env_parse, invalid, ConfigError};

/// Database connection pool
pub type DbPool = SqlitePool;

/// Database initialization error
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(String),
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Initialize the database connection pool and run migrations.
///
/// In-memory databases are per-connection in SQLite, so they get a single
/// long-lived connection.
pub async fn init_database(config: &DatabaseConfig) -> Result<DbPool, DatabaseError> {
    info!("Initializing database: {}", config.url);

    let in_memory = is_memory_url(&config.url);

    if !in_memory {
        if let Some(db_path) = config.url.strip_prefix("sqlite://") {
            if let Some(parent) = Path::new(db_path).parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::ConnectionError(sqlx::Error::Configuration(Box::new(e)))
                })?;
            }
        }
    }

    let mut options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
    if !config.log_queries {
        options = options.disable_statement_logging();
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(config.max_connections)
    };

    let pool = pool_options.connect_with(options).await?;

    run_migrations(&pool).await?;

    info!("Database initialized");

    Ok(pool)
}

/// Open an in-memory database with the full schema
pub async fn init_memory_database() -> Result<DbPool, DatabaseError> {
    init_database(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        log_queries: false,
    })
    .await
}

/// Run database migrations
async fn run_migrations(pool: &DbPool) -> Result<(), DatabaseError> {
    info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            transaction_id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp DATETIME NOT NULL,
            client_id TEXT NOT NULL,
            symbol TEXT NOT NULL,
            transaction_type TEXT NOT NULL CHECK(transaction_type IN ('BUY', 'SELL')),
            quantity INTEGER NOT NULL,
            price REAL NOT NULL,
            total_value REAL NOT NULL,
            broker_id TEXT NOT NULL,
            market TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create transactions table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS client_exposures (
            client_id TEXT PRIMARY KEY,
            total_exposure REAL NOT NULL DEFAULT 0.0,
            position_count INTEGER NOT NULL DEFAULT 0,
            risk_level TEXT NOT NULL DEFAULT 'LOW',
            last_updated DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create client_exposures table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS symbol_exposures (
            symbol TEXT PRIMARY KEY,
            total_exposure REAL NOT NULL DEFAULT 0.0,
            transaction_count INTEGER NOT NULL DEFAULT 0,
            risk_level TEXT NOT NULL DEFAULT 'LOW',
            last_updated DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create symbol_exposures table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alerts (
            alert_id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp DATETIME NOT NULL,
            alert_type TEXT NOT NULL,
            severity TEXT NOT NULL CHECK(severity IN ('LOW', 'MEDIUM', 'HIGH', 'CRITICAL')),
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            message TEXT NOT NULL,
            threshold_value REAL NOT NULL,
            current_value REAL NOT NULL,
            acknowledged BOOLEAN NOT NULL DEFAULT 0,
            acknowledged_at DATETIME,
            acknowledged_by TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create alerts table: {}", e)))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS risk_metrics (
            metric_id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp DATETIME NOT NULL,
            total_transactions INTEGER NOT NULL,
            total_exposure REAL NOT NULL,
            active_clients INTEGER NOT NULL,
            active_symbols INTEGER NOT NULL,
            high_risk_clients INTEGER NOT NULL,
            high_risk_symbols INTEGER NOT NULL,
            alerts_generated INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create risk_metrics table: {}", e))
    })?;

    for (name, ddl) in [
        (
            "idx_transactions_client",
            "CREATE INDEX IF NOT EXISTS idx_transactions_client ON transactions(client_id)",
        ),
        (
            "idx_transactions_symbol",
            "CREATE INDEX IF NOT EXISTS idx_transactions_symbol ON transactions(symbol)",
        ),
        (
            "idx_alerts_timestamp",
            "CREATE INDEX IF NOT EXISTS idx_alerts_timestamp ON alerts(timestamp)",
        ),
        (
            "idx_alerts_acknowledged",
            "CREATE INDEX IF NOT EXISTS idx_alerts_acknowledged ON alerts(acknowledged)",
        ),
        (
            "idx_risk_metrics_timestamp",
            "CREATE INDEX IF NOT EXISTS idx_risk_metrics_timestamp ON risk_metrics(timestamp)",
        ),
    ] {
        sqlx::query(ddl).execute(pool).await.map_err(|e| {
            DatabaseError::MigrationError(format!("Failed to create index {}: {}", name, e))
        })?;
    }

    info!("Database migrations completed");

    Ok(())
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://data/riskwatch.db")
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Enable query logging
    pub log_queries: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/riskwatch.db".to_string(),
            max_connections: 5,
            log_queries: cfg!(debug_assertions),
        }
    }
}

impl DatabaseConfig {
    /// Load from environment variables, rejecting values that do not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.url = url;
        }
        if let Some(n) = env_parse("DATABASE_MAX_CONNECTIONS")? {
            config.max_connections = n;
        }
        if let Some(enabled) = env_flag("DATABASE_LOG_QUERIES")? {
            config.log_queries = enabled;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(invalid("DATABASE_URL", "must not be empty"));
        }
        if self.max_connections == 0 {
            return Err(invalid("DATABASE_MAX_CONNECTIONS", "must be greater than zero"));
        }
        Ok(())
    }
}
