#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use folio_api::config::ServerConfig;
use folio_api::router::build_app_router;
use folio_api::state::AppState;
use folio_api::storage::LocalStorage;

/// Boundary used by [`post_multipart`].
const BOUNDARY: &str = "folio-test-boundary";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin and a 1 KiB upload limit so
/// size checks do not need large fixtures.
pub fn test_config(upload_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upload_dir,
        public_upload_prefix: "/uploads".to_string(),
        max_upload_bytes: 1024,
    }
}

/// Build the full application router backed by a fresh temporary upload
/// directory.
pub fn build_test_app(pool: PgPool) -> Router {
    let dir = tempfile::tempdir().unwrap().keep();
    build_test_app_with_dir(pool, &dir)
}

/// Build the full application router storing uploads in `upload_dir`.
///
/// Goes through [`build_app_router`] so integration tests exercise the same
/// middleware stack (CORS, request ID, timeout, tracing, panic recovery)
/// that production uses.
pub fn build_test_app_with_dir(pool: PgPool, upload_dir: &Path) -> Router {
    let config = test_config(upload_dir.to_path_buf());
    let storage = LocalStorage::new(upload_dir, config.public_upload_prefix.clone());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        storage: Arc::new(storage),
    };

    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, Body::empty(), None).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, Body::empty(), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(
        app,
        Method::POST,
        uri,
        Body::from(body.to_string()),
        Some("application/json".to_string()),
    )
    .await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(
        app,
        Method::PUT,
        uri,
        Body::from(body.to_string()),
        Some("application/json".to_string()),
    )
    .await
}

/// POST a multipart form with an optional file part and text fields.
pub async fn post_multipart(
    app: Router,
    uri: &str,
    file: Option<(&str, &[u8])>,
    fields: &[(&str, &str)],
) -> Response {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((mime, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"upload\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    send(
        app,
        Method::POST,
        uri,
        Body::from(body),
        Some(format!("multipart/form-data; boundary={BOUNDARY}")),
    )
    .await
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Body,
    content_type: Option<String>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create records through the API and return their `_id`s in order.
pub async fn seed(
    pool: &PgPool,
    collection: &str,
    create_key: &str,
    records: serde_json::Value,
) -> Vec<String> {
    let app = build_test_app(pool.clone());
    let response = post_json(
        app,
        &format!("/api/{collection}"),
        serde_json::json!({ create_key: records }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let json = body_json(response).await;
    json[collection]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["_id"].as_str().unwrap().to_string())
        .collect()
}

/// A minimal valid PNG header, enough for format sniffing.
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52,
];
