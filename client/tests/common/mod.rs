//! Shared fixtures for the client integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use reviewsync_client::{AuthToken, LocalStore, RemoteClient, RemoteError};
use reviewsync_engine::{Attribute, PhotoId, Review, ReviewId, ReviewUpdate, Score, UpdateStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Test helper to create a synced server review.
pub fn server_review(review_id: ReviewId, score: u8, photos: Vec<PhotoId>) -> Review {
    Review {
        review_id,
        user_id: 7,
        product_id: 3,
        text: format!("review {}", review_id),
        score: Score::new(score).unwrap(),
        likes: 2,
        dislikes: 1,
        created_at: "2024-02-01T10:00:00Z".to_string(),
        status: UpdateStatus::Synced,
        attributes: vec![Attribute::positive("Fast"), Attribute::negative("Loud")],
        photos,
    }
}

pub async fn memory_store() -> LocalStore {
    LocalStore::in_memory().await.unwrap()
}

/// A remote call as seen by [`StubRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Push(ReviewUpdate),
    Upload { review_id: ReviewId, uri: String },
    DeletePhoto { review_id: ReviewId, photo_id: PhotoId },
    DeleteReview(ReviewId),
    Fetch,
}

/// In-process remote that records every call.
///
/// `fail_on` makes the n-th call (1-based) fail. `gate` parks the first
/// call until the test releases it.
#[derive(Default)]
pub struct StubRemote {
    pub calls: Mutex<Vec<Call>>,
    pub fail_on: Option<usize>,
    pub server_reviews: Vec<Review>,
    pub gate: Option<Arc<Notify>>,
    pub entered: Arc<Notify>,
    seen: AtomicUsize,
}

impl StubRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn with_server_reviews(reviews: Vec<Review>) -> Self {
        Self {
            server_reviews: reviews,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    async fn record(&self, call: Call) -> Result<(), RemoteError> {
        let n = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(gate) = &self.gate {
            if n == 1 {
                self.entered.notify_one();
                gate.notified().await;
            }
        }
        self.calls.lock().unwrap().push(call);
        if self.fail_on == Some(n) {
            return Err(RemoteError::Rejected(format!("call {} refused", n)));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteClient for StubRemote {
    async fn push_review_update(
        &self,
        update: &ReviewUpdate,
        _token: &AuthToken,
    ) -> Result<ReviewId, RemoteError> {
        self.record(Call::Push(update.clone())).await?;
        Ok(update.review_id)
    }

    async fn upload_photo(
        &self,
        review_id: ReviewId,
        local_uri: &str,
        _token: &AuthToken,
    ) -> Result<(), RemoteError> {
        self.record(Call::Upload {
            review_id,
            uri: local_uri.to_string(),
        })
        .await
    }

    async fn delete_photo(
        &self,
        review_id: ReviewId,
        photo_id: PhotoId,
        _token: &AuthToken,
    ) -> Result<(), RemoteError> {
        self.record(Call::DeletePhoto {
            review_id,
            photo_id,
        })
        .await
    }

    async fn delete_review(
        &self,
        review_id: ReviewId,
        _token: &AuthToken,
    ) -> Result<(), RemoteError> {
        self.record(Call::DeleteReview(review_id)).await
    }

    async fn fetch_reviews(&self, _token: &AuthToken) -> Result<Vec<Review>, RemoteError> {
        self.record(Call::Fetch).await?;
        Ok(self.server_reviews.clone())
    }
}
