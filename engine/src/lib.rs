//! # Reviewsync Engine
//!
//! Domain model and sync planning for an offline-first review store.
//!
//! This crate holds the parts of the review store that do not touch a disk
//! or a network: the row types, the pending-change markers, the order in
//! which a sync pass replays local changes, and the in-memory review cache.
//! Persistence and the remote service live in `reviewsync-client`.
//!
//! ## Core Concepts
//!
//! ### Reviews
//!
//! A [`Review`] is identified by the server-assigned `review_id` and owns a
//! list of [`Attribute`]s (pros and cons) and the ids of its server photos.
//!
//! ### Update status
//!
//! Every stored row carries an [`UpdateStatus`]:
//! - [`UpdateStatus::Synced`] - matches the server
//! - [`UpdateStatus::PendingAdd`] - created locally (photos)
//! - [`UpdateStatus::PendingUpdate`] - edited locally
//! - [`UpdateStatus::PendingDelete`] - marked for removal locally
//!
//! ### Photos
//!
//! A [`Photo`] with a positive id is confirmed by the server. A negative id
//! is a local placeholder for a photo that still has to be uploaded.
//!
//! ### Sync plan
//!
//! [`SyncPlan::build`] turns the pending reviews of a scan into an ordered
//! list of [`ReplayStep`]s. The client executes them one by one and commits
//! only when all of them succeeded.
//!
//! ## Quick Start
//!
//! ```rust
//! use reviewsync_engine::{
//!     Attribute, DeleteReplay, PendingReview, Photo, Review, Score, SyncPlan, UpdateStatus,
//! };
//!
//! let review = Review {
//!     review_id: 42,
//!     user_id: 7,
//!     product_id: 3,
//!     text: "Boils fast".to_string(),
//!     score: Score::new(80).unwrap(),
//!     likes: 0,
//!     dislikes: 0,
//!     created_at: "2024-02-01T10:00:00Z".to_string(),
//!     status: UpdateStatus::PendingUpdate,
//!     attributes: vec![Attribute::positive("Fast")],
//!     photos: vec![],
//! };
//!
//! let pending = vec![PendingReview {
//!     review,
//!     photos: vec![Photo::local(-1, "file:///tmp/kettle.jpg")],
//! }];
//!
//! let plan = SyncPlan::build(&pending, DeleteReplay::default());
//! assert_eq!(plan.counts().reviews_pushed, 1);
//! assert_eq!(plan.counts().photos_uploaded, 1);
//! ```

pub mod cache;
pub mod error;
pub mod plan;
pub mod review;
pub mod status;

// Re-export main types at crate root
pub use cache::ReviewCache;
pub use error::Error;
pub use plan::{DeleteReplay, PendingReview, ReplayStep, StepCounts, SyncPlan};
pub use review::{Attribute, Photo, Review, ReviewEdit, ReviewUpdate, Score, SERVER_PHOTO_PATH};
pub use status::UpdateStatus;

/// Type aliases for clarity
pub type ReviewId = i64;
pub type PhotoId = i64;
pub type UserId = i64;
pub type ProductId = i64;
