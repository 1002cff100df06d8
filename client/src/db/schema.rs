//! Table definitions for reviews, photos and attributes.
//!
//! [`initialize`] is idempotent. [`reset`] drops every table and recreates
//! it; the store calls it whenever a query hits a storage fault, which
//! discards any unsynced local changes.

use sqlx::SqliteConnection;

/// Version recorded in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 2;

const CREATE_REVIEWS: &str = r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        review_id INTEGER NOT NULL UNIQUE,
        user_id INTEGER NOT NULL,
        product_id INTEGER NOT NULL,
        text TEXT NOT NULL,
        score INTEGER NOT NULL,
        likes INTEGER NOT NULL DEFAULT 0,
        dislikes INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        update_status INTEGER NOT NULL DEFAULT 0,
        revision INTEGER NOT NULL DEFAULT 0
    )
"#;

const CREATE_PHOTOS: &str = r#"
    CREATE TABLE IF NOT EXISTS photos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        review_id INTEGER NOT NULL REFERENCES reviews(review_id),
        photo_id INTEGER NOT NULL,
        update_status INTEGER NOT NULL DEFAULT 0,
        path TEXT NOT NULL
    )
"#;

const CREATE_ATTRIBUTES: &str = r#"
    CREATE TABLE IF NOT EXISTS attributes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        review_id INTEGER NOT NULL REFERENCES reviews(review_id),
        is_positive INTEGER NOT NULL,
        text TEXT NOT NULL
    )
"#;

const CREATE_INDEXES: [&str; 2] = [
    "CREATE INDEX IF NOT EXISTS idx_photos_review ON photos(review_id)",
    "CREATE INDEX IF NOT EXISTS idx_attributes_review ON attributes(review_id)",
];

/// Children first.
const DROP_TABLES: [&str; 3] = [
    "DROP TABLE IF EXISTS attributes",
    "DROP TABLE IF EXISTS photos",
    "DROP TABLE IF EXISTS reviews",
];

/// Create all tables if absent.
///
/// A database written by a different schema version is reset first.
pub async fn initialize(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let version = user_version(conn).await?;
    if version != 0 && version != SCHEMA_VERSION {
        tracing::warn!(
            found = version,
            expected = SCHEMA_VERSION,
            "schema version changed, recreating tables"
        );
        drop_tables(conn).await?;
    }

    create_tables(conn).await
}

/// Drop all tables and recreate them.
pub async fn reset(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    drop_tables(conn).await?;
    create_tables(conn).await
}

/// Read the stored schema version (0 for a fresh database).
pub async fn user_version(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let result: (i64,) = sqlx::query_as("PRAGMA user_version")
        .fetch_one(&mut *conn)
        .await?;
    Ok(result.0)
}

async fn create_tables(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    for statement in [CREATE_REVIEWS, CREATE_PHOTOS, CREATE_ATTRIBUTES] {
        sqlx::query(statement).execute(&mut *conn).await?;
    }
    for statement in CREATE_INDEXES {
        sqlx::query(statement).execute(&mut *conn).await?;
    }

    // PRAGMA arguments cannot be bound
    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
        .execute(&mut *conn)
        .await?;

    Ok(())
}

async fn drop_tables(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    for statement in DROP_TABLES {
        sqlx::query(statement).execute(&mut *conn).await?;
    }
    Ok(())
}
