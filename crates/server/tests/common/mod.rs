//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock collaborators injected, enabling E2E testing of every stage
//! endpoint without network access or ffmpeg.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use shorts_core::collab::PlatformPublisher;
use shorts_core::collector::{FeedItem, FeedSource};
use shorts_core::config::{
    Config, DatabaseConfig, ScriptConfig, ServerConfig, StorageConfig, VideoConfig,
};
use shorts_core::record::Platform;
use shorts_core::testing::{
    MockFeedSource, MockFootageSearch, MockMediaRunner, MockNotifier, MockPlatformPublisher,
    MockSpeechSynthesizer, MockTextGenerator, MockTranscriber,
};
use shorts_core::{LocalAssetStore, SqliteRecordStore};
use shorts_server::state::{AppState, Collaborators};

/// Re-export fixtures for test convenience
pub use shorts_core::testing::fixtures;

/// Public base URL the fixture's asset store reports.
pub const ASSET_BASE_URL: &str = "http://localhost:8080/assets";

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_collect() {
///     let fixture = TestFixture::new().await;
///     fixture.feed.set_items(vec![FeedItem::new("AI", "https://a", 5000)]).await;
///
///     let response = fixture.post("/collect", json!({})).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub store: Arc<SqliteRecordStore>,
    pub feed: Arc<MockFeedSource>,
    /// Shared by script writing and keyword extraction
    pub llm: Arc<MockTextGenerator>,
    pub speech: Arc<MockSpeechSynthesizer>,
    pub footage: Arc<MockFootageSearch>,
    pub runner: Arc<MockMediaRunner>,
    pub notifier: Arc<MockNotifier>,
    pub youtube: Arc<MockPlatformPublisher>,
    pub tiktok: Arc<MockPlatformPublisher>,
    pub instagram: Arc<MockPlatformPublisher>,
    /// Temporary directory for the database, assets and scratch space
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Response whose body is not JSON
#[derive(Debug)]
pub struct TextResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            storage: StorageConfig {
                root: temp_dir.path().join("assets"),
                public_base_url: ASSET_BASE_URL.to_string(),
            },
            script: ScriptConfig {
                sales_probability: 0.0,
                seed: Some(7),
                ..ScriptConfig::default()
            },
            video: VideoConfig {
                temp_dir: temp_dir.path().join("scratch"),
                ..VideoConfig::default()
            },
            ..Config::default()
        };

        let store = Arc::new(SqliteRecordStore::new(&db_path).expect("Failed to create store"));
        let assets = Arc::new(LocalAssetStore::from_config(&config.storage));

        // Create mocks
        let feed = Arc::new(MockFeedSource::new("hackernews", 100));
        let llm = Arc::new(MockTextGenerator::new());
        let speech = Arc::new(MockSpeechSynthesizer::new());
        let footage = Arc::new(MockFootageSearch::new());
        let runner = Arc::new(MockMediaRunner::new());
        let notifier = Arc::new(MockNotifier::new());
        let youtube = Arc::new(MockPlatformPublisher::new(Platform::Youtube));
        let tiktok = Arc::new(MockPlatformPublisher::new(Platform::Tiktok));
        let instagram = Arc::new(MockPlatformPublisher::new(Platform::Instagram));

        runner.set_file_duration("narration.mp3", 50.0).await;
        runner.set_file_duration("final.mp4", 50.1).await;

        let sources: Vec<Arc<dyn FeedSource>> = vec![feed.clone()];
        let publishers: Vec<Arc<dyn PlatformPublisher>> =
            vec![youtube.clone(), tiktok.clone(), instagram.clone()];
        let collaborators = Collaborators {
            sources,
            script_llm: llm.clone(),
            keyword_llm: llm.clone(),
            speech: speech.clone(),
            transcriber: Arc::new(MockTranscriber::new()),
            footage: footage.clone(),
            runner: runner.clone(),
            notifier: notifier.clone(),
            publishers,
        };

        let state = Arc::new(AppState::new(config, store.clone(), assets, collaborators));
        let router = shorts_server::api::create_router(state);

        Self {
            router,
            store,
            feed,
            llm,
            speech,
            footage,
            runner,
            notifier,
            youtube,
            tiktok,
            instagram,
            temp_dir,
        }
    }

    /// 300 characters mentioning AI, ending in a sentence terminator.
    pub fn narration() -> String {
        let prefix = "AI 혁신이 시작됐습니다.";
        let pad = 299 - prefix.chars().count();
        format!("{}{}.", prefix, "가".repeat(pad))
    }

    /// Queue one trending topic in the mock feed.
    pub async fn queue_topic(&self, title: &str, score: i64) {
        self.feed
            .set_items(vec![FeedItem::new(
                title,
                format!("https://news.example/{}", title.len()),
                score,
            )])
            .await;
    }

    /// Stock portrait footage for the "artificial intelligence" keyword.
    pub async fn stock_ai_footage(&self, clips: u64) {
        self.footage
            .set_results("artificial intelligence", fixtures::portrait_clips(clips, 12.0))
            .await;
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, _, bytes) = self.send(request).await;
        TestResponse {
            status,
            body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        }
    }

    /// Send a GET request and keep the body as text (HTML pages, assets,
    /// metrics).
    pub async fn get_text(&self, path: &str) -> TextResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let (status, content_type, bytes) = self.send(request).await;
        TextResponse {
            status,
            content_type,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Send a CORS preflight for a POST to `path` and return the status and
    /// headers.
    pub async fn preflight(&self, path: &str) -> (StatusCode, HeaderMap) {
        let request = Request::builder()
            .method("OPTIONS")
            .uri(path)
            .header("Origin", "https://dashboard.example")
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", "content-type")
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        (response.status(), response.headers().clone())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        let (status, _, bytes) = self.send(request).await;

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, content_type, body_bytes.to_vec())
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
