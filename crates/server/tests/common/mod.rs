//! Common test utilities for in-process server tests.
//!
//! This module provides a test fixture that builds the full router with a
//! mock encoder injected, so uploads can be driven end to end without ffmpeg.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use mediashrink_core::{
    testing::MockConverter, Config, JobCoordinator, ObserverConnection, ObserverRegistry,
    TranscodeWorker, WorkerMessage,
};
use mediashrink_server::{api::create_router, state::AppState};

const BOUNDARY: &str = "mediashrink-test-boundary";

/// Test fixture with an in-process router and a mock encoder.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_upload() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.upload("a.png", "image/png", b"png").await;
///     assert_eq!(response.status, StatusCode::CREATED);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock encoder shared with the worker
    pub converter: MockConverter,
    /// Observer registry the coordinator broadcasts to
    pub registry: Arc<ObserverRegistry>,
    /// Where uploads are stored
    pub upload_dir: PathBuf,
    /// Keeps the upload and scratch directories alive
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default configuration.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test fixture, adjusting the configuration first.
    pub async fn with_config(configure: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let upload_dir = temp_dir.path().join("uploads");
        let scratch_dir = temp_dir.path().join("scratch");
        std::fs::create_dir_all(&upload_dir).expect("Failed to create upload dir");

        let mut config = Config::default();
        config.storage.upload_dir = upload_dir.clone();
        config.encoder.temp_dir = scratch_dir.clone();
        configure(&mut config);

        let converter = MockConverter::new();
        let registry = Arc::new(ObserverRegistry::new());
        let worker = TranscodeWorker::new(
            Arc::new(converter.clone()),
            config.policy.clone(),
            scratch_dir,
        );
        let coordinator = JobCoordinator::new(worker, Arc::clone(&registry));

        let state = Arc::new(AppState::new(config, coordinator));
        let router = create_router(state);

        Self {
            router,
            converter,
            registry,
            upload_dir,
            temp_dir,
        }
    }

    /// Register an observer and return its queue.
    pub async fn observe(&self) -> tokio::sync::mpsc::Receiver<Arc<str>> {
        let (connection, rx) = ObserverConnection::channel(32);
        self.registry.register(connection).await;
        rx
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// POST a multipart upload with a single `file` part.
    pub async fn upload(&self, filename: &str, content_type: &str, content: &[u8]) -> TestResponse {
        self.upload_field("file", filename, content_type, content)
            .await
    }

    /// POST a multipart upload with a single part named `field`.
    pub async fn upload_field(
        &self,
        field: &str,
        filename: &str,
        content_type: &str,
        content: &[u8],
    ) -> TestResponse {
        let body = multipart_body(field, filename, content_type, content);
        self.send(multipart_request(Body::from(body))).await
    }

    /// Serve the router on a real listener and return its address.
    ///
    /// Needed for WebSocket tests; the server task lives until the runtime ends.
    pub async fn serve(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().unwrap();
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        addr
    }

    /// Wait until the registry holds `count` observers.
    pub async fn wait_for_observers(&self, count: usize) {
        for _ in 0..200 {
            if self.registry.len().await == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {} observers, have {}",
            count,
            self.registry.len().await
        );
    }

    /// Names of files in the upload directory, hidden ones included.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.upload_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

/// A multipart body with a single part.
pub fn multipart_body(field: &str, filename: &str, content_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// POST `/api/v1/upload` carrying a body built with [`multipart_body`].
pub fn multipart_request(body: Body) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(body)
        .unwrap()
}

/// Receive observer notifications until a terminal result arrives.
pub async fn messages_until_result(
    rx: &mut tokio::sync::mpsc::Receiver<Arc<str>>,
) -> Vec<WorkerMessage> {
    let mut messages = Vec::new();
    loop {
        let raw = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("notification in time")
            .expect("observer still registered");
        let message: WorkerMessage = serde_json::from_str(&raw).expect("valid worker message");
        let done = message.is_terminal();
        messages.push(message);
        if done {
            return messages;
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
