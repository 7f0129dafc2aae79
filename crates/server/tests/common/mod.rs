//! Common test utilities for in-process API testing with mocks.
//!
//! This module provides a test fixture that builds the full router over
//! real SQLite stores in a temp directory and a scripted site scraper, so
//! jobs run end to end without spawning scraper processes.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use mieszkanieo_core::{
    testing::MockSiteScraper, Config, DatabaseConfig, Job, JobOrchestrator, JobStore,
    ListingStore, OrchestratorConfig, SqliteJobStore, SqliteListingStore,
};
use mieszkanieo_server::state::AppState;

/// Re-export fixtures for test convenience
pub use mieszkanieo_core::testing::fixtures;

/// Test fixture for API testing with a mock scraper.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_job_creation() {
///     let fixture = TestFixture::new().await;
///     fixture.scraper.succeed("otodom", 3).await;
///
///     let response = fixture.post("/api/v1/scraping-jobs", json!({
///         "city": "Katowice",
///         "sites": ["otodom"]
///     })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock scraper - script per-site results
    pub scraper: Arc<MockSiteScraper>,
    /// Job store behind the API
    pub job_store: Arc<SqliteJobStore>,
    /// Listing store behind the API
    pub listing_store: Arc<SqliteListingStore>,
    /// Orchestrator behind the API, for waiting on jobs
    pub orchestrator: JobOrchestrator,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with the default site list.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            orchestrator: OrchestratorConfig::default(),
            ..Default::default()
        };

        let scraper = Arc::new(MockSiteScraper::new());
        let job_store =
            Arc::new(SqliteJobStore::new(&db_path).expect("Failed to create job store"));
        let listing_store = Arc::new(
            SqliteListingStore::new(&db_path).expect("Failed to create listing store"),
        );

        let orchestrator = JobOrchestrator::new(
            config.orchestrator.clone(),
            Arc::clone(&job_store) as Arc<dyn JobStore>,
            Arc::clone(&listing_store) as Arc<dyn ListingStore>,
            Arc::clone(&scraper) as Arc<dyn mieszkanieo_core::SiteScraper>,
            config.scraper.site_ids(),
        );

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&job_store) as Arc<dyn JobStore>,
            Arc::clone(&listing_store) as Arc<dyn ListingStore>,
            orchestrator.clone(),
        ));

        let router = mieszkanieo_server::api::create_router(state);

        Self {
            router,
            scraper,
            job_store,
            listing_store,
            orchestrator,
            temp_dir,
        }
    }

    /// Wait until a job's task has ended and return the final record.
    pub async fn wait_for_job(&self, id: &str) -> Job {
        tokio::time::timeout(std::time::Duration::from_secs(5), self.orchestrator.wait(id))
            .await
            .expect("Timed out waiting for job")
            .expect("Job should exist")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let (status, bytes) = self.send(request).await;
        TestResponse {
            status,
            body: parse_body(&bytes),
        }
    }

    /// Send a GET request and return the body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let (status, bytes) = self.send(request).await;
        (status, String::from_utf8_lossy(&bytes).into_owned())
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
        let (status, bytes) = self.send(request).await;

        TestResponse {
            status,
            body: parse_body(&bytes),
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, body_bytes.to_vec())
    }
}

fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
    }
}
