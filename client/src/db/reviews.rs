//! Database operations for the reviews table.

use super::decode_column;
use reviewsync_engine::{Attribute, PhotoId, Review, ReviewId, Score, UpdateStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

const REVIEW_COLUMNS: &str = "review_id, user_id, product_id, text, score, likes, dislikes, \
                              created_at, update_status, revision";

/// A stored review row, without its attributes and photos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReview {
    pub review_id: ReviewId,
    pub user_id: i64,
    pub product_id: i64,
    pub text: String,
    pub score: Score,
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: String,
    pub status: UpdateStatus,
    /// Bumped by every local mutation of the row
    pub revision: i64,
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for StoredReview {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(StoredReview {
            review_id: row.try_get("review_id")?,
            user_id: row.try_get("user_id")?,
            product_id: row.try_get("product_id")?,
            text: row.try_get("text")?,
            score: decode_column("score", Score::try_from(row.try_get::<i64, _>("score")?))?,
            likes: row.try_get("likes")?,
            dislikes: row.try_get("dislikes")?,
            created_at: row.try_get("created_at")?,
            status: decode_column(
                "update_status",
                UpdateStatus::from_code(row.try_get("update_status")?),
            )?,
            revision: row.try_get("revision")?,
        })
    }
}

impl StoredReview {
    /// Attach child rows to build the domain review.
    pub fn into_review(self, attributes: Vec<Attribute>, photos: Vec<PhotoId>) -> Review {
        Review {
            review_id: self.review_id,
            user_id: self.user_id,
            product_id: self.product_id,
            text: self.text,
            score: self.score,
            likes: self.likes,
            dislikes: self.dislikes,
            created_at: self.created_at,
            status: self.status,
            attributes,
            photos,
        }
    }
}

/// Insert a review row with the given status.
pub async fn insert_review(
    conn: &mut SqliteConnection,
    review: &Review,
    status: UpdateStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO reviews (
            review_id, user_id, product_id, text, score,
            likes, dislikes, created_at, update_status
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(review.review_id)
    .bind(review.user_id)
    .bind(review.product_id)
    .bind(&review.text)
    .bind(i64::from(review.score))
    .bind(review.likes)
    .bind(review.dislikes)
    .bind(&review.created_at)
    .bind(status.code())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Get a review row by its server id.
pub async fn get_review(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
) -> Result<Option<StoredReview>, sqlx::Error> {
    sqlx::query_as::<_, StoredReview>(&format!(
        "SELECT {} FROM reviews WHERE review_id = ?",
        REVIEW_COLUMNS
    ))
    .bind(review_id)
    .fetch_optional(&mut *conn)
    .await
}

/// Get all review rows in row order, optionally skipping pending deletes.
pub async fn get_reviews(
    conn: &mut SqliteConnection,
    include_deleted: bool,
) -> Result<Vec<StoredReview>, sqlx::Error> {
    let sql = if include_deleted {
        format!("SELECT {} FROM reviews ORDER BY id ASC", REVIEW_COLUMNS)
    } else {
        format!(
            "SELECT {} FROM reviews WHERE update_status != ? ORDER BY id ASC",
            REVIEW_COLUMNS
        )
    };

    let mut query = sqlx::query_as::<_, StoredReview>(&sql);
    if !include_deleted {
        query = query.bind(UpdateStatus::PendingDelete.code());
    }
    query.fetch_all(&mut *conn).await
}

/// Get every review row with a pending change, in row order.
pub async fn get_pending_reviews(
    conn: &mut SqliteConnection,
) -> Result<Vec<StoredReview>, sqlx::Error> {
    sqlx::query_as::<_, StoredReview>(&format!(
        "SELECT {} FROM reviews WHERE update_status > ? ORDER BY id ASC",
        REVIEW_COLUMNS
    ))
    .bind(UpdateStatus::Synced.code())
    .fetch_all(&mut *conn)
    .await
}

/// Count reviews with a pending change.
pub async fn count_pending(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE update_status > ?")
        .bind(UpdateStatus::Synced.code())
        .fetch_one(&mut *conn)
        .await?;

    Ok(result.0.max(0) as u64)
}

/// Overwrite text and score and set the status. Returns affected rows.
pub async fn update_content(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
    text: &str,
    score: Score,
    status: UpdateStatus,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE reviews SET text = ?, score = ?, update_status = ?, revision = revision + 1 \
         WHERE review_id = ?",
    )
    .bind(text)
    .bind(i64::from(score))
    .bind(status.code())
    .bind(review_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Set the status of a single review. Returns affected rows.
pub async fn set_status(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
    status: UpdateStatus,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE reviews SET update_status = ?, revision = revision + 1 WHERE review_id = ?",
    )
    .bind(status.code())
    .bind(review_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Clear every pending review back to synced.
pub async fn reset_pending(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE reviews SET update_status = ? WHERE update_status > ?")
        .bind(UpdateStatus::Synced.code())
        .bind(UpdateStatus::Synced.code())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Clear a pending review back to synced, unless it changed since
/// `revision` was read. Returns affected rows.
pub async fn clear_pending_at(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
    revision: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE reviews SET update_status = ? \
         WHERE review_id = ? AND revision = ? AND update_status > ?",
    )
    .bind(UpdateStatus::Synced.code())
    .bind(review_id)
    .bind(revision)
    .bind(UpdateStatus::Synced.code())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Remove a review row, unless it changed since `revision` was read.
pub async fn delete_review_at(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
    revision: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reviews WHERE review_id = ? AND revision = ?")
        .bind(review_id)
        .bind(revision)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Physically remove a review row.
pub async fn delete_review(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reviews WHERE review_id = ?")
        .bind(review_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
