//! Review, attribute and photo types.

use crate::{error::Result, Error, PhotoId, ProductId, ReviewId, UpdateStatus, UserId};
use serde::{Deserialize, Serialize};

/// Path stored for photos that already live on the server.
pub const SERVER_PHOTO_PATH: &str = "server";

/// A review score in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 100;

    /// Create a score, rejecting values above 100.
    pub fn new(value: u8) -> Result<Self> {
        if value > Self::MAX {
            return Err(Error::ScoreOutOfRange(value as i64));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        u8::try_from(value)
            .map_err(|_| Error::ScoreOutOfRange(value))
            .and_then(Score::new)
    }
}

impl From<Score> for i64 {
    fn from(score: Score) -> Self {
        score.0 as i64
    }
}

/// A pro or con attached to a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub text: String,
    pub is_positive: bool,
}

impl Attribute {
    pub fn positive(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_positive: true,
        }
    }

    pub fn negative(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_positive: false,
        }
    }
}

/// A photo row as stored locally.
///
/// The sign of `photo_id` carries meaning: positive ids were assigned by the
/// server, negative ids are placeholders for photos that still need upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub photo_id: PhotoId,
    /// Local URI for pending uploads, [`SERVER_PHOTO_PATH`] otherwise
    pub path: String,
    pub status: UpdateStatus,
}

impl Photo {
    /// A photo the server already knows about.
    pub fn server(photo_id: PhotoId) -> Self {
        Self {
            photo_id,
            path: SERVER_PHOTO_PATH.to_string(),
            status: UpdateStatus::Synced,
        }
    }

    /// A photo picked on this device, not yet uploaded.
    pub fn local(placeholder_id: PhotoId, uri: impl Into<String>) -> Self {
        Self {
            photo_id: placeholder_id,
            path: uri.into(),
            status: UpdateStatus::PendingAdd,
        }
    }

    pub fn is_server_confirmed(&self) -> bool {
        self.photo_id > 0
    }

    pub fn is_local_only(&self) -> bool {
        self.photo_id < 0
    }

    /// Whether a sync pass must upload this photo.
    pub fn needs_upload(&self) -> bool {
        self.is_local_only() && self.status == UpdateStatus::PendingAdd
    }

    /// Whether a sync pass must delete this photo on the server.
    pub fn needs_remote_delete(&self) -> bool {
        self.is_server_confirmed() && self.status == UpdateStatus::PendingDelete
    }

    /// Whether this photo is shown on the regular read path.
    pub fn is_visible(&self) -> bool {
        self.is_server_confirmed() && self.status == UpdateStatus::Synced
    }
}

/// A user-authored review with its attributes and server photos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Server-assigned identifier
    pub review_id: ReviewId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub text: String,
    pub score: Score,
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: String,
    #[serde(default)]
    pub status: UpdateStatus,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Ids of server-confirmed photos
    #[serde(default)]
    pub photos: Vec<PhotoId>,
}

impl Review {
    /// Whether the review is visible on the default read path.
    pub fn is_active(&self) -> bool {
        !self.status.is_pending_delete()
    }

    pub fn positive_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.is_positive)
    }

    pub fn negative_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| !a.is_positive)
    }
}

/// New content for an existing review, as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEdit {
    pub text: String,
    pub score: Score,
    pub attributes: Vec<Attribute>,
}

/// Payload pushed to the server for a pending review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpdate {
    pub review_id: ReviewId,
    pub text: String,
    pub score: Score,
    pub attributes: Vec<Attribute>,
}

impl From<&Review> for ReviewUpdate {
    fn from(review: &Review) -> Self {
        Self {
            review_id: review.review_id,
            text: review.text.clone(),
            score: review.score,
            attributes: review.attributes.clone(),
        }
    }
}
