//! Mock tracking sink for testing
//!
//! This module provides a mock HTTP server that stands in for the analytics
//! API the session tracker posts to. It uses wiremock to create configurable
//! mock responses and to inspect what was received.

use serde_json::Value;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const START_SESSION: &str = "/start-session";
pub const TRACK_MESSAGE: &str = "/track-message";
pub const UPDATE_USER_DATA: &str = "/update-user-data";

/// Mock tracking API server for testing
pub struct TrackingMockServer {
    pub server: MockServer,
}

/// A request the sink received, in arrival order
#[derive(Debug, Clone)]
pub struct ReceivedEvent {
    pub path: String,
    pub body: Value,
}

impl TrackingMockServer {
    /// Create a new mock tracking server
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Answer every endpoint with 200
    pub async fn setup_default_mocks(&self) {
        for endpoint in [START_SESSION, TRACK_MESSAGE, UPDATE_USER_DATA] {
            self.mock_status(endpoint, 200).await;
        }
    }

    /// Answer an endpoint with a fixed status
    pub async fn mock_status(&self, endpoint: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_string("{\"success\":true}"))
            .mount(&self.server)
            .await;
    }

    /// Fail an endpoint `failures` times with `status` before answering 200
    pub async fn mock_flaky(&self, endpoint: &str, status: u16, failures: u64) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_string("upstream unavailable"))
            .up_to_n_times(failures)
            .with_priority(1)
            .mount(&self.server)
            .await;

        self.mock_status(endpoint, 200).await;
    }

    /// Every request received so far
    pub async fn received(&self) -> Vec<ReceivedEvent> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|request| ReceivedEvent {
                path: request.url.path().to_string(),
                body: serde_json::from_slice(&request.body).unwrap_or(Value::Null),
            })
            .collect()
    }

    /// Requests received on one endpoint
    pub async fn received_on(&self, endpoint: &str) -> Vec<ReceivedEvent> {
        self.received()
            .await
            .into_iter()
            .filter(|event| event.path == endpoint)
            .collect()
    }

    /// Reset all mocks and recorded requests
    pub async fn reset(&self) {
        self.server.reset().await;
    }
}
