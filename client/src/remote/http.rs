//! HTTP implementation of [`RemoteClient`].

use super::{AuthToken, RemoteClient, RemoteError};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use reviewsync_engine::{Attribute, PhotoId, Review, ReviewId, ReviewUpdate, Score};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request body for a review push.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushBody<'a> {
    text: &'a str,
    score: Score,
    attributes: &'a [Attribute],
}

/// Response for a review push.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushResponse {
    review_id: ReviewId,
}

/// Review service client over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpRemoteClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteClient {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder, token: &AuthToken) -> RequestBuilder {
        if token.is_empty() {
            request
        } else {
            request.bearer_auth(token.as_str())
        }
    }

    async fn send_delete(&self, path: String, token: &AuthToken) -> Result<(), RemoteError> {
        let response = self
            .authorize(self.client.delete(self.url(&path)), token)
            .send()
            .await?;

        // Already gone: a replayed delete must not fail the pass
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(path = %path, "delete target already absent");
            return Ok(());
        }

        check_status(response).await?;
        Ok(())
    }
}

/// Turn a non-success response into an error.
async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(RemoteError::Unauthorized);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Filesystem path for a local photo URI.
fn local_path(uri: &str) -> &str {
    uri.strip_prefix("file://").unwrap_or(uri)
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn push_review_update(
        &self,
        update: &ReviewUpdate,
        token: &AuthToken,
    ) -> Result<ReviewId, RemoteError> {
        let body = PushBody {
            text: &update.text,
            score: update.score,
            attributes: &update.attributes,
        };

        let response = self
            .authorize(
                self.client
                    .put(self.url(&format!("reviews/{}", update.review_id)))
                    .json(&body),
                token,
            )
            .send()
            .await?;

        let parsed: PushResponse = check_status(response).await?.json().await?;
        Ok(parsed.review_id)
    }

    async fn upload_photo(
        &self,
        review_id: ReviewId,
        local_uri: &str,
        token: &AuthToken,
    ) -> Result<(), RemoteError> {
        let path = local_path(local_uri);
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| RemoteError::PhotoRead {
                path: path.to_string(),
                source,
            })?;

        let response = self
            .authorize(
                self.client
                    .post(self.url(&format!("reviews/{}/photos", review_id)))
                    .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                    .body(bytes),
                token,
            )
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    async fn delete_photo(
        &self,
        review_id: ReviewId,
        photo_id: PhotoId,
        token: &AuthToken,
    ) -> Result<(), RemoteError> {
        self.send_delete(format!("reviews/{}/photos/{}", review_id, photo_id), token)
            .await
    }

    async fn delete_review(
        &self,
        review_id: ReviewId,
        token: &AuthToken,
    ) -> Result<(), RemoteError> {
        self.send_delete(format!("reviews/{}", review_id), token)
            .await
    }

    async fn fetch_reviews(&self, token: &AuthToken) -> Result<Vec<Review>, RemoteError> {
        let response = self
            .authorize(self.client.get(self.url("reviews")), token)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }
}
