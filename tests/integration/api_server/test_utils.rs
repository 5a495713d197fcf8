//! Test utilities for API server integration tests

use axum_test::TestServer;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use alertrix::core::http::{create_router, AppState, HealthStatus};
use alertrix::metrics::Metrics;

/// Test helper for API server integration tests.
///
/// Runs without store connections: health and metrics behave normally,
/// everything touching persistence answers 503.
#[allow(dead_code)]
pub struct TestApiServer {
    pub server: TestServer,
    pub metrics: Arc<Metrics>,
}

impl TestApiServer {
    pub async fn new() -> Self {
        let metrics = Arc::new(Metrics::new().expect("metrics initialization"));
        let state = AppState {
            health: Arc::new(RwLock::new(HealthStatus::default())),
            metrics: metrics.clone(),
            start_time: Arc::new(Instant::now()),
            database: None,
            engine: None,
            eval_queue: None,
        };

        let app = create_router(state);
        let server = TestServer::new(app).expect("start test server");

        Self { server, metrics }
    }
}
