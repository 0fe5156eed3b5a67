//! Shared setup for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::{NamedTempFile, TempDir};
use tower::ServiceExt;

use dashboard::config::Config;
use dashboard::database::{init_db, AppState, Store};
use dashboard::route::create_app;

/// A router over a throwaway database and uploads directory.
///
/// Both are removed when the value is dropped, so keep it alive for the
/// whole test.
pub struct TestApp {
    pub router: Router,
    pub uploads: TempDir,
    _db: NamedTempFile,
}

pub fn setup_test_app() -> TestApp {
    setup_with(|_| {})
}

/// Same as [`setup_test_app`], with a chance to adjust the configuration.
pub fn setup_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let uploads = TempDir::new().expect("Failed to create uploads dir");

    let mut config = Config {
        database_url: temp_db.path().to_str().unwrap().to_string(),
        uploads_dir: uploads.path().to_path_buf(),
        // cheapest cost bcrypt accepts
        bcrypt_cost: 4,
        ..Config::default()
    };
    configure(&mut config);

    let db = init_db(&config.database_url).expect("Failed to initialize test database");
    let state = AppState {
        store: Store::new(db),
        config: Arc::new(config),
    };

    TestApp {
        router: create_app(state),
        uploads,
        _db: temp_db,
    }
}

impl TestApp {
    /// Sends a request, with an optional JSON body, and returns the status
    /// and the parsed response body (`Value::Null` when empty).
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        (status, response_json(response.into_body()).await)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("PATCH", uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, None).await
    }

    /// Creates a document and returns its `_id`.
    pub async fn create(&self, uri: &str, body: Value) -> String {
        let (status, body) = self.post(uri, body).await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
        body["_id"].as_str().expect("missing _id").to_string()
    }
}

/// Helper function to parse response body as JSON
pub async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}
