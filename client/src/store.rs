//! LocalStore - the persisted review cache.
//!
//! The store owns three tables (reviews, photos, attributes) and tracks which
//! rows carry a local change the server has not confirmed yet. Writes set a
//! pending status; only the sync engine clears it.
//!
//! # Storage faults
//!
//! Public operations never return storage errors. When a query fails the
//! store logs it, drops and recreates every table, and answers with an empty
//! result (no rows, not found, or a no-op write). This keeps the UI usable
//! after schema corruption at the price of discarding unsynced local changes.

use crate::db::{self, attributes, photos, reviews, schema, Pool};
use crate::error::Result;
use reviewsync_engine::{
    Attribute, PendingReview, Photo, PhotoId, Review, ReviewCache, ReviewEdit, ReviewId,
    UpdateStatus,
};
use sqlx::SqliteConnection;

/// Pending rows captured at the start of a sync pass.
///
/// Committing a pass settles only these rows, so a change made while the
/// pass was replaying stays pending for the next one.
#[derive(Debug, Clone, Default)]
pub struct PassScan {
    pending: Vec<PendingReview>,
    reviews: Vec<ScannedReview>,
    photos: Vec<photos::StoredPhoto>,
}

#[derive(Debug, Clone, Copy)]
struct ScannedReview {
    review_id: ReviewId,
    revision: i64,
}

impl PassScan {
    /// The scanned reviews with all of their photo rows, in row order.
    pub fn pending(&self) -> &[PendingReview] {
        &self.pending
    }

    pub fn into_pending(self) -> Vec<PendingReview> {
        self.pending
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

/// Embedded SQLite store for reviews and their pending changes.
#[derive(Debug, Clone)]
pub struct LocalStore {
    pool: Pool,
}

impl LocalStore {
    /// Open (or create) the store at `database_url` and initialize its schema.
    pub async fn open(database_url: &str) -> Result<Self> {
        let pool = db::create_pool(database_url).await?;
        Self::from_pool(pool).await
    }

    /// Open a private in-memory store.
    pub async fn in_memory() -> Result<Self> {
        let pool = db::create_memory_pool().await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool and initialize its schema.
    pub async fn from_pool(pool: Pool) -> Result<Self> {
        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Create all tables if absent. Safe to call repeatedly.
    pub async fn initialize(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        schema::initialize(&mut conn).await?;
        Ok(())
    }

    /// Drop every table and recreate it, discarding all local data.
    pub async fn reload_tables(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        schema::reset(&mut tx).await?;
        tx.commit().await?;
        tracing::info!("local tables reloaded");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Store a review received from the server, with its attributes and
    /// server photos. Any previous copy of the same review is replaced.
    pub async fn add_review(&self, review: &Review) {
        let result = self.try_add_review(review).await;
        self.recover("add_review", result).await
    }

    /// Insert a single attribute row.
    pub async fn add_attribute(&self, review_id: ReviewId, attribute: &Attribute) {
        let result = async {
            let mut conn = self.pool.acquire().await?;
            attributes::insert_attribute(&mut conn, review_id, attribute).await
        }
        .await;
        self.recover("add_attribute", result).await
    }

    /// Insert a single photo row.
    pub async fn add_photo(
        &self,
        review_id: ReviewId,
        path: &str,
        photo_id: PhotoId,
        status: UpdateStatus,
    ) {
        let result = async {
            let mut conn = self.pool.acquire().await?;
            photos::insert_photo(&mut conn, review_id, path, photo_id, status).await
        }
        .await;
        self.recover("add_photo", result).await
    }

    /// Apply a local edit.
    ///
    /// Marks the review pending update with the new text and score, replaces
    /// its attributes, flags the listed server photos for deletion, drops the
    /// previous local-only photos and queues `new_local_photo_uris` for
    /// upload. Does nothing if the review is not stored.
    pub async fn update_review(
        &self,
        edit: &ReviewEdit,
        review_id: ReviewId,
        server_photo_ids_to_delete: &[PhotoId],
        new_local_photo_uris: &[String],
    ) {
        let result = self
            .try_update_review(
                edit,
                review_id,
                server_photo_ids_to_delete,
                new_local_photo_uris,
            )
            .await;
        self.recover("update_review", result).await
    }

    /// Mark a review for deletion. Attributes and photos are left untouched.
    pub async fn delete_review(&self, review_id: ReviewId) {
        let result = async {
            let mut conn = self.pool.acquire().await?;
            reviews::set_status(&mut conn, review_id, UpdateStatus::PendingDelete).await
        }
        .await;

        if self.recover("delete_review", result).await == 0 {
            tracing::warn!(review_id, "delete_review: review not stored locally");
        }
    }

    /// Clear every pending review and photo back to synced.
    pub async fn reset_all_pending_statuses(&self) {
        let result = async {
            let mut tx = self.pool.begin().await?;
            let cleared = reset_pending(&mut tx).await?;
            tx.commit().await?;
            Ok::<_, sqlx::Error>(cleared)
        }
        .await;

        let cleared = self.recover("reset_all_pending_statuses", result).await;
        tracing::debug!(rows = cleared, "pending statuses cleared");
    }

    /// Replace the whole store with reviews fetched from the server.
    pub async fn replace_all(&self, server_reviews: &[Review]) {
        let result = async {
            let mut tx = self.pool.begin().await?;
            schema::reset(&mut tx).await?;
            for review in server_reviews {
                insert_review_tree(&mut tx, review).await?;
            }
            tx.commit().await
        }
        .await;
        self.recover("replace_all", result).await
    }

    /// Finish a successful sync pass over the rows in `scan`.
    ///
    /// Photo rows whose change was replayed are purged (remote deletes and
    /// uploads) or cleared; `deleted_reviews` are removed with their
    /// children; every other scanned review is cleared to synced. Rows
    /// changed after the scan keep their pending status. One transaction.
    pub async fn commit_sync_pass(&self, scan: &PassScan, deleted_reviews: &[ReviewId]) {
        let result = async {
            let mut tx = self.pool.begin().await?;

            let mut settled_photos = 0u64;
            for row in &scan.photos {
                settled_photos += photos::settle_replayed(&mut tx, row).await?;
            }

            let (mut removed, mut cleared) = (0u64, 0u64);
            for scanned in &scan.reviews {
                let review_id = scanned.review_id;
                if deleted_reviews.contains(&review_id) {
                    if reviews::delete_review_at(&mut tx, review_id, scanned.revision).await? > 0 {
                        attributes::delete_attributes(&mut tx, review_id).await?;
                        photos::delete_photos(&mut tx, review_id).await?;
                        removed += 1;
                    }
                } else {
                    cleared += reviews::clear_pending_at(&mut tx, review_id, scanned.revision)
                        .await?;
                }
            }

            tx.commit().await?;
            Ok::<_, sqlx::Error>((settled_photos, removed, cleared))
        }
        .await;

        let (settled_photos, removed, cleared) = self.recover("commit_sync_pass", result).await;
        let kept = (scan.reviews.len() as u64).saturating_sub(removed + cleared);
        if kept > 0 {
            tracing::info!(kept, "reviews changed during the pass stay pending");
        }
        tracing::debug!(
            settled_photos,
            removed_reviews = removed,
            cleared_reviews = cleared,
            "sync pass committed"
        );
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// All reviews in row order, hydrated with attributes and server photos.
    ///
    /// Reviews pending deletion are skipped unless `include_deleted` is set.
    pub async fn get_all_reviews(&self, include_deleted: bool) -> Vec<Review> {
        let result = async {
            let mut conn = self.pool.acquire().await?;
            let rows = reviews::get_reviews(&mut conn, include_deleted).await?;
            let mut hydrated = Vec::with_capacity(rows.len());
            for row in rows {
                hydrated.push(hydrate(&mut conn, row).await?);
            }
            Ok::<_, sqlx::Error>(hydrated)
        }
        .await;
        self.recover("get_all_reviews", result).await
    }

    /// A single review, hydrated like [`get_all_reviews`](Self::get_all_reviews).
    pub async fn get_review(&self, review_id: ReviewId) -> Option<Review> {
        let result = async {
            let mut conn = self.pool.acquire().await?;
            match reviews::get_review(&mut conn, review_id).await? {
                Some(row) => Ok::<_, sqlx::Error>(Some(hydrate(&mut conn, row).await?)),
                None => Ok(None),
            }
        }
        .await;
        self.recover("get_review", result).await
    }

    /// URIs of the photos of a review that are not on the server yet.
    pub async fn get_local_photos(&self, review_id: ReviewId) -> Vec<String> {
        let result = async {
            let mut conn = self.pool.acquire().await?;
            photos::get_local_uris(&mut conn, review_id).await
        }
        .await;
        self.recover("get_local_photos", result).await
    }

    /// Pending reviews in row order, each with all of its photo rows.
    pub async fn pending_reviews(&self) -> Vec<PendingReview> {
        self.scan_pending().await.into_pending()
    }

    /// Capture every pending row for a sync pass. One read transaction.
    pub async fn scan_pending(&self) -> PassScan {
        let result = async {
            let mut tx = self.pool.begin().await?;
            let rows = reviews::get_pending_reviews(&mut tx).await?;

            let mut scan = PassScan::default();
            for row in rows {
                let scanned = ScannedReview {
                    review_id: row.review_id,
                    revision: row.revision,
                };
                let review = hydrate(&mut tx, row).await?;
                let photo_rows = photos::get_photo_rows(&mut tx, scanned.review_id).await?;

                scan.photos.extend(
                    photo_rows
                        .iter()
                        .filter(|r| r.photo.status.is_pending())
                        .cloned(),
                );
                scan.pending.push(PendingReview {
                    review,
                    photos: photo_rows.into_iter().map(|r| r.photo).collect(),
                });
                scan.reviews.push(scanned);
            }

            tx.commit().await?;
            Ok::<_, sqlx::Error>(scan)
        }
        .await;
        self.recover("scan_pending", result).await
    }

    /// Photo rows of a review that carry a pending change.
    pub async fn pending_photos(&self, review_id: ReviewId) -> Vec<Photo> {
        let result = async {
            let mut conn = self.pool.acquire().await?;
            photos::get_pending_photos(&mut conn, review_id).await
        }
        .await;
        self.recover("pending_photos", result).await
    }

    /// Number of reviews with a pending change.
    pub async fn pending_count(&self) -> u64 {
        let result = async {
            let mut conn = self.pool.acquire().await?;
            reviews::count_pending(&mut conn).await
        }
        .await;
        self.recover("pending_count", result).await
    }

    /// Reload `cache` from the store.
    pub async fn refresh_cache(&self, cache: &mut ReviewCache, include_deleted: bool) {
        let snapshot = self.get_all_reviews(include_deleted).await;
        tracing::debug!(reviews = snapshot.len(), "review cache refreshed");
        cache.replace(snapshot);
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn try_add_review(&self, review: &Review) -> std::result::Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        delete_review_tree(&mut tx, review.review_id).await?;
        insert_review_tree(&mut tx, review).await?;
        tx.commit().await
    }

    async fn try_update_review(
        &self,
        edit: &ReviewEdit,
        review_id: ReviewId,
        server_photo_ids_to_delete: &[PhotoId],
        new_local_photo_uris: &[String],
    ) -> std::result::Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let updated = reviews::update_content(
            &mut tx,
            review_id,
            &edit.text,
            edit.score,
            UpdateStatus::PendingUpdate,
        )
        .await?;
        if updated == 0 {
            tracing::warn!(review_id, "update_review: review not stored locally");
            return Ok(());
        }

        attributes::replace_attributes(&mut tx, review_id, &edit.attributes).await?;

        for &photo_id in server_photo_ids_to_delete {
            if photos::mark_deleted(&mut tx, review_id, photo_id).await? == 0 {
                tracing::debug!(review_id, photo_id, "photo to delete not stored locally");
            }
        }

        photos::delete_local_photos(&mut tx, review_id).await?;
        for uri in new_local_photo_uris {
            let placeholder = photos::next_placeholder_id(&mut tx).await?;
            photos::insert_photo(&mut tx, review_id, uri, placeholder, UpdateStatus::PendingAdd)
                .await?;
        }

        tx.commit().await
    }

    /// Absorb a storage error: log it, reset the schema, return the empty
    /// value for the operation.
    async fn recover<T: Default>(
        &self,
        operation: &'static str,
        result: std::result::Result<T, sqlx::Error>,
    ) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(operation, error = %err, "local store query failed");
                if is_storage_fault(&err) {
                    self.reset_after_fault(operation).await;
                }
                T::default()
            }
        }
    }

    async fn reset_after_fault(&self, operation: &'static str) {
        tracing::warn!(
            operation,
            "resetting local schema; unsynced local changes are discarded"
        );
        if let Err(err) = self.reload_tables().await {
            tracing::error!(operation, error = %err, "schema reset failed");
        }
    }
}

/// Errors raised by the storage engine itself, as opposed to pool
/// exhaustion or shutdown.
fn is_storage_fault(err: &sqlx::Error) -> bool {
    !matches!(
        err,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed
    )
}

async fn hydrate(
    conn: &mut SqliteConnection,
    row: reviews::StoredReview,
) -> std::result::Result<Review, sqlx::Error> {
    let attributes = attributes::get_attributes(conn, row.review_id).await?;
    let photos = photos::get_server_photo_ids(conn, row.review_id).await?;
    Ok(row.into_review(attributes, photos))
}

async fn insert_review_tree(
    conn: &mut SqliteConnection,
    review: &Review,
) -> std::result::Result<(), sqlx::Error> {
    reviews::insert_review(conn, review, UpdateStatus::Synced).await?;
    for &photo_id in &review.photos {
        let photo = Photo::server(photo_id);
        photos::insert_photo(conn, review.review_id, &photo.path, photo_id, photo.status).await?;
    }
    for attribute in &review.attributes {
        attributes::insert_attribute(conn, review.review_id, attribute).await?;
    }
    Ok(())
}

async fn delete_review_tree(
    conn: &mut SqliteConnection,
    review_id: ReviewId,
) -> std::result::Result<(), sqlx::Error> {
    attributes::delete_attributes(conn, review_id).await?;
    photos::delete_photos(conn, review_id).await?;
    reviews::delete_review(conn, review_id).await?;
    Ok(())
}

async fn reset_pending(conn: &mut SqliteConnection) -> std::result::Result<u64, sqlx::Error> {
    let review_rows = reviews::reset_pending(conn).await?;
    let photo_rows = photos::reset_pending(conn).await?;
    Ok(review_rows + photo_rows)
}
