//! Database connection pool management.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Type alias for the database pool.
pub type Pool = SqlitePool;

/// Create a pool for a SQLite database file, creating the file if missing.
///
/// Foreign keys stay informational: child rows may reference reviews that
/// are not stored locally.
pub async fn create_pool(database_url: &str) -> Result<Pool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(false);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Create a pool over a private in-memory database.
///
/// Every SQLite connection to `:memory:` sees its own database, so the pool
/// is pinned to a single connection that is never recycled.
pub async fn create_memory_pool() -> Result<Pool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(false);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}
