//! Replay planning for a sync pass.
//!
//! Given the pending reviews found by a scan, this module decides which
//! remote calls a pass makes and in which order. It performs no IO; the
//! client crate executes the plan step by step and stops at the first error.
//!
//! # Order
//!
//! Reviews are replayed in scan (row) order. For each review:
//!
//! 1. Push the review content
//! 2. Upload every local-only photo that is pending add
//! 3. Delete every server photo that is pending delete
//!
//! Under [`DeleteReplay::DispatchDelete`] a pending-delete review produces a
//! single delete call instead.

use crate::{error::Result, Error, Photo, PhotoId, Review, ReviewId, ReviewUpdate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a review marked for deletion is replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteReplay {
    /// Push the review like any other pending change (default)
    #[default]
    PushUpdate,
    /// Ask the server to delete the review, then purge it locally
    DispatchDelete,
}

impl FromStr for DeleteReplay {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "push-update" => Ok(DeleteReplay::PushUpdate),
            "dispatch-delete" => Ok(DeleteReplay::DispatchDelete),
            other => Err(Error::UnknownDeleteReplay(other.to_string())),
        }
    }
}

/// A pending review together with all of its photo rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReview {
    pub review: Review,
    pub photos: Vec<Photo>,
}

impl PendingReview {
    /// Photo rows of the review that carry a pending change.
    pub fn pending_photos(&self) -> impl Iterator<Item = &Photo> {
        self.photos.iter().filter(|p| p.status.is_pending())
    }
}

/// A single remote call in a sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReplayStep {
    PushReview(ReviewUpdate),
    UploadPhoto { review_id: ReviewId, uri: String },
    DeletePhoto { review_id: ReviewId, photo_id: PhotoId },
    DeleteReview { review_id: ReviewId },
}

impl ReplayStep {
    /// The review this step belongs to.
    pub fn review_id(&self) -> ReviewId {
        match self {
            ReplayStep::PushReview(update) => update.review_id,
            ReplayStep::UploadPhoto { review_id, .. } => *review_id,
            ReplayStep::DeletePhoto { review_id, .. } => *review_id,
            ReplayStep::DeleteReview { review_id } => *review_id,
        }
    }
}

impl fmt::Display for ReplayStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayStep::PushReview(update) => write!(f, "push review {}", update.review_id),
            ReplayStep::UploadPhoto { review_id, uri } => {
                write!(f, "upload photo {} for review {}", uri, review_id)
            }
            ReplayStep::DeletePhoto {
                review_id,
                photo_id,
            } => write!(f, "delete photo {} of review {}", photo_id, review_id),
            ReplayStep::DeleteReview { review_id } => write!(f, "delete review {}", review_id),
        }
    }
}

/// Per-kind step counts, used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepCounts {
    pub reviews_pushed: usize,
    pub photos_uploaded: usize,
    pub photos_deleted: usize,
    pub reviews_deleted: usize,
}

impl StepCounts {
    pub fn record(&mut self, step: &ReplayStep) {
        match step {
            ReplayStep::PushReview(_) => self.reviews_pushed += 1,
            ReplayStep::UploadPhoto { .. } => self.photos_uploaded += 1,
            ReplayStep::DeletePhoto { .. } => self.photos_deleted += 1,
            ReplayStep::DeleteReview { .. } => self.reviews_deleted += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.reviews_pushed + self.photos_uploaded + self.photos_deleted + self.reviews_deleted
    }
}

/// The ordered remote calls of one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    steps: Vec<ReplayStep>,
    deleted_reviews: Vec<ReviewId>,
}

impl SyncPlan {
    /// Build the plan for the given scan result.
    ///
    /// Reviews that are not pending are skipped; a scan can race with a
    /// concurrent commit.
    pub fn build(pending: &[PendingReview], policy: DeleteReplay) -> Self {
        let mut plan = SyncPlan::default();

        for entry in pending {
            let review = &entry.review;
            if !review.status.is_pending() {
                continue;
            }

            if policy == DeleteReplay::DispatchDelete && review.status.is_pending_delete() {
                plan.steps.push(ReplayStep::DeleteReview {
                    review_id: review.review_id,
                });
                plan.deleted_reviews.push(review.review_id);
                continue;
            }

            plan.steps.push(ReplayStep::PushReview(ReviewUpdate::from(review)));

            plan.steps.extend(
                entry
                    .photos
                    .iter()
                    .filter(|p| p.needs_upload())
                    .map(|p| ReplayStep::UploadPhoto {
                        review_id: review.review_id,
                        uri: p.path.clone(),
                    }),
            );

            plan.steps.extend(
                entry
                    .photos
                    .iter()
                    .filter(|p| p.needs_remote_delete())
                    .map(|p| ReplayStep::DeletePhoto {
                        review_id: review.review_id,
                        photo_id: p.photo_id,
                    }),
            );
        }

        plan
    }

    pub fn steps(&self) -> &[ReplayStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Reviews whose remote delete is part of this plan.
    pub fn deleted_reviews(&self) -> &[ReviewId] {
        &self.deleted_reviews
    }

    /// Step counts for the whole plan.
    pub fn counts(&self) -> StepCounts {
        let mut counts = StepCounts::default();
        for step in &self.steps {
            counts.record(step);
        }
        counts
    }
}
