//! Database connection module for the MomCare application
//!
//! SQLite is the only supported backend. A file-backed pool is preferred;
//! when the file cannot be opened the pool falls back to an in-memory database.

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, error, info, warn};

use super::migrations::{clear_all_tables, run_sqlite_migrations};
use super::DatabaseError;
use crate::repository::RepositoryError;

const DEFAULT_SQLITE_PATH: &str = "data/momcare.db";

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    /// SQLite database (file-based or in-memory)
    Sqlite,
}

impl std::str::FromStr for DatabaseType {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(DatabaseType::Sqlite),
            _ => Err(DatabaseError::UnsupportedDatabaseType(s.to_string())),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database type
    pub db_type: DatabaseType,
    /// Path to SQLite database file; `None` selects an in-memory database
    pub sqlite_path: Option<String>,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DatabaseType::Sqlite,
            sqlite_path: Some(DEFAULT_SQLITE_PATH.to_string()),
            max_connections: 10,
            timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    /// Configuration for a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            sqlite_path: None,
            ..Self::default()
        }
    }

    /// Create a new database configuration from environment variables
    pub fn from_env() -> Result<Self, DatabaseError> {
        let db_type: DatabaseType = env::var("DB_TYPE")
            .unwrap_or_else(|_| "sqlite".to_string())
            .parse()?;

        let sqlite_path = match env::var("DB_SQLITE_PATH") {
            Ok(path) if path == ":memory:" => None,
            Ok(path) => Some(path),
            Err(_) => {
                info!("No DB_SQLITE_PATH provided, using default path: {}", DEFAULT_SQLITE_PATH);
                Some(DEFAULT_SQLITE_PATH.to_string())
            }
        };

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(10);

        let timeout_seconds = env::var("DB_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        if max_connections == 0 {
            return Err(DatabaseError::Config("DB_MAX_CONNECTIONS must be at least 1".to_string()));
        }

        info!("Database configuration: type={:?}, max_connections={}, timeout={}s",
            db_type, max_connections, timeout_seconds);

        Ok(DatabaseConfig {
            db_type,
            sqlite_path,
            max_connections,
            timeout_seconds,
        })
    }
}

/// Where the pool's connections point
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// SQLite file on disk
    File(String),
    /// Private in-memory database
    Memory,
}

/// Shared SQLite connection pool
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: Arc<r2d2::Pool<SqliteConnectionManager>>,
    location: DatabaseLocation,
}

impl DatabasePool {
    /// Build the pool described by `config` and run migrations
    pub fn initialize(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        info!("Initializing database pool with type: {:?}", config.db_type);

        let pool = match &config.sqlite_path {
            Some(path) => initialize_sqlite_pool(path, config)?,
            None => initialize_in_memory_sqlite_pool(config)?,
        };

        pool.migrate()?;
        Ok(pool)
    }

    /// In-memory pool with the schema applied
    pub fn in_memory() -> Result<Self, DatabaseError> {
        Self::initialize(&DatabaseConfig::in_memory())
    }

    /// Location of the underlying database
    pub fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    /// Run the schema migrations on a pooled connection
    pub fn migrate(&self) -> Result<(), DatabaseError> {
        let conn = self.pool.get()?;
        run_sqlite_migrations(&conn)
    }

    /// Remove every row from every table
    pub fn clear(&self) -> Result<(), DatabaseError> {
        let conn = self.pool.get()?;
        clear_all_tables(&conn)
    }

    /// Run blocking database work on the blocking thread pool
    pub async fn with_connection<F, T>(&self, work: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&Connection) -> Result<T, RepositoryError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            work(&conn)
        })
        .await
        .map_err(|e| RepositoryError::Task(e.to_string()))?
    }

    /// Verify a connection can be checked out and queried
    pub fn check(&self) -> Result<(), DatabaseError> {
        let conn = self.pool.get()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Human readable description of the connection
    pub fn connection_info(&self) -> String {
        let state = self.pool.state();
        let target = match &self.location {
            DatabaseLocation::File(path) => format!("SQLite database at {}", path),
            DatabaseLocation::Memory => "SQLite in-memory database".to_string(),
        };
        format!("{} (connections: active={}, idle={})",
            target, state.connections, state.idle_connections)
    }
}

/// Initialize a file-backed SQLite connection pool
fn initialize_sqlite_pool(sqlite_path: &str, config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    info!("Initializing SQLite database at: {}", sqlite_path);

    if let Some(parent) = Path::new(sqlite_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            info!("Creating parent directory: {:?}", parent);
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Failed to create directory: {}, falling back to in-memory database", e);
                return initialize_in_memory_sqlite_pool(config);
            }
        }
    }

    let manager = SqliteConnectionManager::file(sqlite_path)
        .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE)
        .with_init(|conn| conn.busy_timeout(Duration::from_secs(5)));

    let pool = match r2d2::Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(Duration::from_secs(config.timeout_seconds))
        .build(manager)
    {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to create SQLite connection pool: {}", e);
            warn!("Falling back to in-memory SQLite database");
            return initialize_in_memory_sqlite_pool(config);
        }
    };

    if let Err(e) = pool.get() {
        error!("Failed to connect to SQLite database: {}", e);
        warn!("Falling back to in-memory SQLite database");
        return initialize_in_memory_sqlite_pool(config);
    }

    info!("SQLite connection pool created successfully");
    Ok(DatabasePool {
        pool: Arc::new(pool),
        location: DatabaseLocation::File(sqlite_path.to_string()),
    })
}

/// Initialize an in-memory SQLite database
///
/// Every in-memory connection is its own database, so the pool holds exactly
/// one connection and never recycles it.
fn initialize_in_memory_sqlite_pool(config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    info!("Initializing in-memory SQLite database");

    let manager = SqliteConnectionManager::memory();
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .min_idle(Some(1))
        .idle_timeout(None)
        .max_lifetime(None)
        .connection_timeout(Duration::from_secs(config.timeout_seconds))
        .build(manager)?;

    debug!("In-memory SQLite pool ready");
    Ok(DatabasePool {
        pool: Arc::new(pool),
        location: DatabaseLocation::Memory,
    })
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.db_type, DatabaseType::Sqlite);
        assert_eq!(config.sqlite_path.as_deref(), Some(DEFAULT_SQLITE_PATH));
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_database_type_from_str() {
        assert_eq!("sqlite".parse::<DatabaseType>().unwrap(), DatabaseType::Sqlite);
        assert_eq!("SQLite".parse::<DatabaseType>().unwrap(), DatabaseType::Sqlite);
        assert!("mongodb".parse::<DatabaseType>().is_err());
    }

    #[test]
    fn test_in_memory_pool_is_migrated() {
        let pool = DatabasePool::in_memory().unwrap();
        assert_eq!(pool.location(), &DatabaseLocation::Memory);
        assert!(pool.check().is_ok());
        assert!(pool.connection_info().contains("in-memory"));
    }

    #[tokio::test]
    async fn test_in_memory_pool_shares_one_database() {
        let pool = DatabasePool::in_memory().unwrap();

        pool.with_connection(|conn| {
            conn.execute(
                "INSERT INTO messages (id, sender_id, receiver_id, content, is_ai, created_at)
                 VALUES ('m1', 'a', 'b', 'hello', 0, '2024-01-01T00:00:00.000000Z')",
                [],
            )?;
            Ok(())
        }).await.unwrap();

        let count: i64 = pool.with_connection(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?)
        }).await.unwrap();

        assert_eq!(count, 1);
    }

    #[test]
    fn test_file_pool_creates_parent_directory() {
        let dir = std::env::temp_dir().join(format!("momcare-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("test.db");
        let config = DatabaseConfig {
            sqlite_path: Some(path.to_string_lossy().to_string()),
            max_connections: 2,
            ..DatabaseConfig::default()
        };

        let pool = DatabasePool::initialize(&config).unwrap();
        assert!(matches!(pool.location(), DatabaseLocation::File(_)));
        assert!(path.exists());

        let _ = std::fs::remove_dir_all(dir);
    }
}
