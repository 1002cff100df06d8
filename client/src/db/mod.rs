//! SQLite persistence for the local review store.
//!
//! Every function takes a `&mut SqliteConnection` so that callers can run
//! it on a pooled connection or inside a transaction.

pub mod attributes;
pub mod photos;
mod pool;
pub mod reviews;
pub mod schema;

pub use pool::*;

/// Map a domain decoding error onto the sqlx column error.
pub(crate) fn decode_column<T>(
    column: &str,
    value: Result<T, reviewsync_engine::Error>,
) -> Result<T, sqlx::Error> {
    value.map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
