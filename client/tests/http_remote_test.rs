//! Integration tests for the HTTP remote against a local stub server.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use reviewsync_client::{AuthToken, HttpRemoteClient, RemoteClient, RemoteError};
use reviewsync_engine::{Attribute, ReviewUpdate, Score};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TOKEN: &str = "secret-token";

type Log = Arc<Mutex<Vec<String>>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

async fn push_review(
    State(log): State<Log>,
    headers: HeaderMap,
    Path(review_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    log.lock().unwrap().push(format!(
        "PUT {} score={} attributes={}",
        review_id,
        body["score"],
        body["attributes"].as_array().map(|a| a.len()).unwrap_or(0)
    ));
    Json(json!({ "reviewId": review_id })).into_response()
}

async fn upload_photo(
    State(log): State<Log>,
    headers: HeaderMap,
    Path(review_id): Path<i64>,
    body: Bytes,
) -> StatusCode {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    log.lock()
        .unwrap()
        .push(format!("POST {} bytes={}", review_id, body.len()));
    StatusCode::CREATED
}

async fn delete_photo(
    State(log): State<Log>,
    Path((review_id, photo_id)): Path<(i64, i64)>,
) -> StatusCode {
    log.lock()
        .unwrap()
        .push(format!("DELETE {}/{}", review_id, photo_id));
    match photo_id {
        404 => StatusCode::NOT_FOUND,
        500 => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::NO_CONTENT,
    }
}

async fn delete_review(State(log): State<Log>, Path(review_id): Path<i64>) -> StatusCode {
    log.lock().unwrap().push(format!("DELETE {}", review_id));
    StatusCode::NO_CONTENT
}

async fn fetch_reviews(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([
        {
            "reviewId": 42,
            "userId": 7,
            "productId": 3,
            "text": "Boils fast",
            "score": 80,
            "likes": 4,
            "dislikes": 0,
            "createdAt": "2024-02-01T10:00:00Z",
            "attributes": [{ "text": "Fast", "isPositive": true }],
            "photos": [11, 12]
        }
    ]))
    .into_response()
}

/// Start the stub server; returns its base URL and request log.
async fn spawn_server() -> (String, Log) {
    let log = Log::default();
    let app = Router::new()
        .route("/api/reviews", get(fetch_reviews))
        .route("/api/reviews/{review_id}", put(push_review).delete(delete_review))
        .route("/api/reviews/{review_id}/photos", post(upload_photo))
        .route(
            "/api/reviews/{review_id}/photos/{photo_id}",
            delete(delete_photo),
        )
        .with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api/", addr), log)
}

fn client(base_url: &str) -> HttpRemoteClient {
    HttpRemoteClient::new(base_url, Duration::from_secs(5)).unwrap()
}

fn update() -> ReviewUpdate {
    ReviewUpdate {
        review_id: 42,
        text: "Great kettle".to_string(),
        score: Score::new(80).unwrap(),
        attributes: vec![Attribute::positive("Fast"), Attribute::positive("Quiet")],
    }
}

#[cfg(test)]
mod http_tests {
    use super::*;

    #[tokio::test]
    async fn test_push_review_update() {
        let (base_url, log) = spawn_server().await;
        let remote = client(&base_url);

        let confirmed = remote
            .push_review_update(&update(), &AuthToken::new(TOKEN))
            .await
            .unwrap();

        assert_eq!(confirmed, 42);
        assert_eq!(
            log.lock().unwrap().as_slice(),
            ["PUT 42 score=80 attributes=2"]
        );
    }

    #[tokio::test]
    async fn test_bad_token_is_unauthorized() {
        let (base_url, _log) = spawn_server().await;
        let remote = client(&base_url);

        let err = remote
            .push_review_update(&update(), &AuthToken::new("wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Unauthorized));

        let err = remote
            .fetch_reviews(&AuthToken::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Unauthorized));
    }

    #[tokio::test]
    async fn test_upload_photo_sends_file_bytes() {
        let (base_url, log) = spawn_server().await;
        let remote = client(&base_url);

        let path = std::env::temp_dir().join(format!("reviewsync-{}.jpg", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, vec![0xffu8; 1024]).await.unwrap();
        let uri = format!("file://{}", path.display());

        remote
            .upload_photo(42, &uri, &AuthToken::new(TOKEN))
            .await
            .unwrap();
        tokio::fs::remove_file(&path).await.ok();

        assert_eq!(log.lock().unwrap().as_slice(), ["POST 42 bytes=1024"]);
    }

    #[tokio::test]
    async fn test_upload_of_missing_file_fails_before_request() {
        let (base_url, log) = spawn_server().await;
        let remote = client(&base_url);

        let err = remote
            .upload_photo(42, "file:///does/not/exist.jpg", &AuthToken::new(TOKEN))
            .await
            .unwrap_err();

        assert!(matches!(err, RemoteError::PhotoRead { .. }));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deletes() {
        let (base_url, log) = spawn_server().await;
        let remote = client(&base_url);
        let token = AuthToken::new(TOKEN);

        remote.delete_photo(42, 11, &token).await.unwrap();
        // Already gone on the server
        remote.delete_photo(42, 404, &token).await.unwrap();
        remote.delete_review(42, &token).await.unwrap();

        let err = remote.delete_photo(42, 500, &token).await.unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 500, .. }));

        assert_eq!(
            log.lock().unwrap().as_slice(),
            ["DELETE 42/11", "DELETE 42/404", "DELETE 42", "DELETE 42/500"]
        );
    }

    #[tokio::test]
    async fn test_fetch_reviews() {
        let (base_url, _log) = spawn_server().await;
        let remote = client(&base_url);

        let reviews = remote.fetch_reviews(&AuthToken::new(TOKEN)).await.unwrap();

        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].review_id, 42);
        assert_eq!(reviews[0].score.value(), 80);
        assert_eq!(reviews[0].photos, vec![11, 12]);
        assert_eq!(reviews[0].attributes, vec![Attribute::positive("Fast")]);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        let remote = client("http://127.0.0.1:9");
        let err = remote
            .fetch_reviews(&AuthToken::new(TOKEN))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Http(_)));
    }
}
