//! Database operations for the attributes table.

use reviewsync_engine::{Attribute, ReviewId};
use sqlx::SqliteConnection;

/// Insert one attribute for a review.
pub async fn insert_attribute(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
    attribute: &Attribute,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO attributes (review_id, is_positive, text) VALUES (?, ?, ?)")
        .bind(review_id)
        .bind(attribute.is_positive)
        .bind(&attribute.text)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Get the attributes of a review in insertion order.
pub async fn get_attributes(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
) -> Result<Vec<Attribute>, sqlx::Error> {
    let rows: Vec<(String, bool)> = sqlx::query_as(
        "SELECT text, is_positive FROM attributes WHERE review_id = ? ORDER BY id ASC",
    )
    .bind(review_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(text, is_positive)| Attribute { text, is_positive })
        .collect())
}

/// Remove every attribute of a review.
pub async fn delete_attributes(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM attributes WHERE review_id = ?")
        .bind(review_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Replace the attributes of a review.
///
/// Two statements; run inside a transaction so a review never ends up with
/// its attributes half replaced.
pub async fn replace_attributes(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
    attributes: &[Attribute],
) -> Result<(), sqlx::Error> {
    delete_attributes(conn, review_id).await?;
    for attribute in attributes {
        insert_attribute(conn, review_id, attribute).await?;
    }
    Ok(())
}
