//! The remote review service as seen by the sync engine.
//!
//! [`RemoteClient`] is the narrow seam between the local store and the
//! network. [`HttpRemoteClient`] talks to the review service over HTTP;
//! tests substitute their own implementations.

mod http;

pub use http::HttpRemoteClient;

use async_trait::async_trait;
use reviewsync_engine::{PhotoId, Review, ReviewId, ReviewUpdate};
use std::fmt;

/// Opaque credential forwarded to the remote service.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "AuthToken(<empty>)")
        } else {
            write!(f, "AuthToken(<redacted>)")
        }
    }
}

/// Errors from a remote call.
///
/// The sync engine does not distinguish retryable from terminal errors:
/// any of these aborts the running pass.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Remote returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to read photo {path}: {source}")]
    PhotoRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Network operations the sync engine replays pending changes with.
///
/// Implementations must be idempotent from the server's point of view: a
/// failed pass is re-run in full, so the same call can arrive twice.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Push the current content of a review. Returns the server's review id.
    async fn push_review_update(
        &self,
        update: &ReviewUpdate,
        token: &AuthToken,
    ) -> Result<ReviewId, RemoteError>;

    /// Upload a local photo file for a review.
    async fn upload_photo(
        &self,
        review_id: ReviewId,
        local_uri: &str,
        token: &AuthToken,
    ) -> Result<(), RemoteError>;

    /// Delete a server photo of a review.
    async fn delete_photo(
        &self,
        review_id: ReviewId,
        photo_id: PhotoId,
        token: &AuthToken,
    ) -> Result<(), RemoteError>;

    /// Delete a review. Only used with `DeleteReplay::DispatchDelete`.
    async fn delete_review(&self, review_id: ReviewId, token: &AuthToken)
        -> Result<(), RemoteError>;

    /// Fetch every review the server holds for this user.
    async fn fetch_reviews(&self, token: &AuthToken) -> Result<Vec<Review>, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_debug_is_redacted() {
        let token = AuthToken::new("secret-value");
        assert_eq!(format!("{:?}", token), "AuthToken(<redacted>)");
        assert_eq!(token.as_str(), "secret-value");
        assert_eq!(format!("{:?}", AuthToken::default()), "AuthToken(<empty>)");
    }

    #[test]
    fn error_display() {
        let err = RemoteError::Status {
            status: 503,
            body: "down".into(),
        };
        assert_eq!(err.to_string(), "Remote returned 503: down");
        assert_eq!(RemoteError::Unauthorized.to_string(), "Unauthorized");
    }
}
