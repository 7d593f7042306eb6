#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use enercast_api::config::{PredictConfig, ServerConfig, StoreBackend};
use enercast_api::router::build_app_router;
use enercast_api::state::AppState;
use enercast_core::prediction::{CompletionSignal, PredictCommand};
use enercast_core::record::{DataType, TimeSeriesRecord};
use enercast_db::{MemoryRecordStore, RecordStore, StoreError};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

/// Prediction job that exits without writing anything.
pub const SILENT_JOB: &str = "exit 0";

/// Prediction job that prints one line and exits.
pub const ECHO_JOB: &str = "echo done";

/// Build a test `ServerConfig` whose prediction job runs `script` via `sh -c`.
pub fn test_config(script: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        store_backend: StoreBackend::Memory,
        predict: PredictConfig {
            command: PredictCommand {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), script.to_string(), "model".to_string()],
            },
            completion: CompletionSignal::AnyOutput,
        },
        job_status_ttl_secs: 3600,
    }
}

/// The full application router plus a handle on its state.
#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// App backed by an empty in-memory store.
    pub fn new(script: &str) -> Self {
        Self::with_store(Arc::new(MemoryRecordStore::new()), script)
    }

    pub fn with_store(store: Arc<dyn RecordStore>, script: &str) -> Self {
        let state = AppState::new(store, test_config(script));
        let router = build_app_router(state.clone());
        Self { router, state }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        into_parts(self.send(request).await).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        into_parts(self.send(request).await).await
    }

    /// Start a prediction for `username` and return its token.
    pub async fn start(&self, username: &str) -> String {
        let (status, json) = self
            .post(
                "/predict",
                serde_json::json!({
                    "username": username,
                    "fromDate": "2024-01-01",
                    "fromTime": "00",
                    "toDate": "2024-01-02",
                    "toTime": "00",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "predict failed: {json}");
        json["token"].as_str().expect("token string").to_string()
    }

    /// Poll `uri` until `end` is true, giving up after five seconds.
    pub async fn poll_until_end(&self, uri: &str, username: &str, token: &str) -> Value {
        let body = serde_json::json!({ "username": username, "token": token });
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let (_, json) = self.post(uri, body.clone()).await;
                if json["end"] == true {
                    return json;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("job never signalled completion")
    }

    /// All stored records of one discriminator.
    pub async fn records_of(&self, data_type: DataType) -> Vec<TimeSeriesRecord> {
        self.state.store.find_by_types(&[data_type]).await.unwrap()
    }
}

/// Split a response into status and JSON body (`Null` when empty).
pub async fn into_parts(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// A record store whose every call fails.
pub struct FailingStore;

fn offline() -> StoreError {
    StoreError::InvalidRecord {
        id: 0,
        reason: "store offline".to_string(),
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn find_all(&self) -> Result<Vec<TimeSeriesRecord>, StoreError> {
        Err(offline())
    }

    async fn find_by_types(
        &self,
        _types: &[DataType],
    ) -> Result<Vec<TimeSeriesRecord>, StoreError> {
        Err(offline())
    }

    async fn delete_by_types(&self, _types: &[DataType]) -> Result<u64, StoreError> {
        Err(offline())
    }

    async fn replace_batch(
        &self,
        _types: &[DataType],
        _records: Vec<TimeSeriesRecord>,
    ) -> Result<u64, StoreError> {
        Err(offline())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Err(offline())
    }
}

/// An in-memory store whose writes stall for `delay` before applying.
pub struct SlowStore {
    inner: MemoryRecordStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryRecordStore::new(),
            delay,
        }
    }
}

#[async_trait]
impl RecordStore for SlowStore {
    async fn find_all(&self) -> Result<Vec<TimeSeriesRecord>, StoreError> {
        self.inner.find_all().await
    }

    async fn find_by_types(
        &self,
        types: &[DataType],
    ) -> Result<Vec<TimeSeriesRecord>, StoreError> {
        self.inner.find_by_types(types).await
    }

    async fn delete_by_types(&self, types: &[DataType]) -> Result<u64, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete_by_types(types).await
    }

    async fn replace_batch(
        &self,
        types: &[DataType],
        records: Vec<TimeSeriesRecord>,
    ) -> Result<u64, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.replace_batch(types, records).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
