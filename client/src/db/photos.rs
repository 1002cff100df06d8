//! Database operations for the photos table.

use super::decode_column;
use reviewsync_engine::{Photo, PhotoId, ReviewId, UpdateStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// A stored photo row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    /// Local row id
    pub id: i64,
    pub review_id: ReviewId,
    pub photo: Photo,
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for StoredPhoto {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(StoredPhoto {
            id: row.try_get("id")?,
            review_id: row.try_get("review_id")?,
            photo: Photo {
                photo_id: row.try_get("photo_id")?,
                path: row.try_get("path")?,
                status: decode_column(
                    "update_status",
                    UpdateStatus::from_code(row.try_get("update_status")?),
                )?,
            },
        })
    }
}

/// Insert a single photo row.
pub async fn insert_photo(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
    path: &str,
    photo_id: PhotoId,
    status: UpdateStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO photos (review_id, photo_id, update_status, path) VALUES (?, ?, ?, ?)")
        .bind(review_id)
        .bind(photo_id)
        .bind(status.code())
        .bind(path)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Get every photo row of a review, with local row ids.
pub async fn get_photo_rows(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
) -> Result<Vec<StoredPhoto>, sqlx::Error> {
    sqlx::query_as::<_, StoredPhoto>(
        r#"
        SELECT id, review_id, photo_id, update_status, path
        FROM photos
        WHERE review_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(review_id)
    .fetch_all(&mut *conn)
    .await
}

/// Get the photo rows of a review that carry a pending change.
pub async fn get_pending_photos(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
) -> Result<Vec<Photo>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StoredPhoto>(
        r#"
        SELECT id, review_id, photo_id, update_status, path
        FROM photos
        WHERE review_id = ? AND update_status > ?
        ORDER BY id ASC
        "#,
    )
    .bind(review_id)
    .bind(UpdateStatus::Synced.code())
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(|r| r.photo).collect())
}

/// Ids of the server-confirmed, synced photos of a review.
pub async fn get_server_photo_ids(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
) -> Result<Vec<PhotoId>, sqlx::Error> {
    let rows: Vec<(PhotoId,)> = sqlx::query_as(
        r#"
        SELECT photo_id FROM photos
        WHERE review_id = ? AND photo_id > 0 AND update_status = ?
        ORDER BY id ASC
        "#,
    )
    .bind(review_id)
    .bind(UpdateStatus::Synced.code())
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// URIs of the local-only photos of a review, whatever their status.
pub async fn get_local_uris(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT path FROM photos WHERE review_id = ? AND photo_id < 0 ORDER BY id ASC",
    )
    .bind(review_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(|(path,)| path).collect())
}

/// Next free placeholder id for a local photo.
///
/// Placeholders are unique across the store: one below the smallest id in
/// use, and never above -1.
pub async fn next_placeholder_id(conn: &mut SqliteConnection) -> Result<PhotoId, sqlx::Error> {
    let result: (i64,) = sqlx::query_as("SELECT COALESCE(MIN(photo_id), 0) FROM photos")
        .fetch_one(&mut *conn)
        .await?;

    Ok(result.0.min(0).saturating_sub(1))
}

/// Flag a photo row of a review for remote deletion. Returns affected rows.
pub async fn mark_deleted(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
    photo_id: PhotoId,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE photos SET update_status = ? WHERE review_id = ? AND photo_id = ?")
            .bind(UpdateStatus::PendingDelete.code())
            .bind(review_id)
            .bind(photo_id)
            .execute(&mut *conn)
            .await?;

    Ok(result.rows_affected())
}

/// Remove the local-only photo rows of a review.
pub async fn delete_local_photos(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM photos WHERE review_id = ? AND photo_id < 0")
        .bind(review_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Remove every photo row of a review.
pub async fn delete_photos(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM photos WHERE review_id = ?")
        .bind(review_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Settle a photo row whose pending change a sync pass replayed.
///
/// Rows pending delete and local rows pending add are removed: the server
/// already applied them. Any other pending row is cleared to synced. Rows
/// whose status changed since `scanned` was read are left alone.
pub async fn settle_replayed(
    conn: &mut SqliteConnection,
    scanned: &StoredPhoto,
) -> Result<u64, sqlx::Error> {
    let (row_id, photo) = (scanned.id, &scanned.photo);
    let status = photo.status;
    let purge =
        status.is_pending_delete() || (photo.is_local_only() && status == UpdateStatus::PendingAdd);

    let query = if purge {
        sqlx::query("DELETE FROM photos WHERE id = ? AND update_status = ?")
            .bind(row_id)
            .bind(status.code())
    } else {
        sqlx::query("UPDATE photos SET update_status = ? WHERE id = ? AND update_status = ?")
            .bind(UpdateStatus::Synced.code())
            .bind(row_id)
            .bind(status.code())
    };

    let result = query.execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

/// Clear every pending photo back to synced.
pub async fn reset_pending(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE photos SET update_status = ? WHERE update_status > ?")
        .bind(UpdateStatus::Synced.code())
        .bind(UpdateStatus::Synced.code())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
