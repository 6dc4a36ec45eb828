//! Mock import service for mocked-mode tests
//!
//! The responder is "smart" and mirrors the real endpoint's contract:
//! - missing or wrong bearer token - 401
//! - body that is not a non-empty array of `{"personId": <positive int>}` - 400
//! - any personId of 999999 - 404
//! - everything else - 200 with `{"status": "success", ...}`

use import_harness::config::ImportApiConfig;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Token the mock accepts
pub const VALID_TOKEN: &str = "test-token";

/// Identifier the mock cannot resolve
pub const UNKNOWN_PERSON_ID: i64 = 999_999;

pub struct MockImportService {
    pub server: MockServer,
}

impl MockImportService {
    /// Start the smart responder
    pub async fn start() -> Self {
        Self::start_with_delay(Duration::ZERO).await
    }

    /// Start the smart responder with every response delayed
    pub async fn start_with_delay(delay: Duration) -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/import"))
            .respond_with(move |req: &Request| respond(req).set_delay(delay))
            .mount(&server)
            .await;

        Self { server }
    }

    /// Start a service that answers every import with `status`
    pub async fn start_with_status(status: u16) -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/import"))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({"error": "internal error"})),
            )
            .mount(&server)
            .await;

        Self { server }
    }

    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Client configuration pointing at this mock
    pub fn config(&self) -> ImportApiConfig {
        ImportApiConfig {
            base_url: self.base_url(),
            token: VALID_TOKEN.to_string(),
            timeout_seconds: 5,
            connect_timeout_seconds: 2,
        }
    }

    /// Requests seen so far
    pub async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }
}

fn respond(req: &Request) -> ResponseTemplate {
    let authorized = req
        .headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {}", VALID_TOKEN));
    if !authorized {
        return ResponseTemplate::new(401).set_body_json(json!({"error": "unauthorized"}));
    }

    let ids = match serde_json::from_slice::<Value>(&req.body).ok().and_then(|v| person_ids(&v)) {
        Some(ids) => ids,
        None => {
            return ResponseTemplate::new(400).set_body_json(json!({"error": "invalid personId"}))
        }
    };

    if ids.contains(&UNKNOWN_PERSON_ID) {
        return ResponseTemplate::new(404).set_body_json(json!({"error": "person not found"}));
    }

    let body = match ids.as_slice() {
        [single] => json!({"status": "success", "personId": single}),
        many => json!({"status": "success", "imported": many}),
    };
    ResponseTemplate::new(200).set_body_json(body).insert_header("x-request-id", "mock-request")
}

/// Positive integer ids of a well-formed payload, `None` otherwise
fn person_ids(payload: &Value) -> Option<Vec<i64>> {
    let entities = payload.as_array().filter(|entities| !entities.is_empty())?;
    entities
        .iter()
        .map(|entity| entity.get("personId").and_then(Value::as_i64).filter(|id| *id > 0))
        .collect()
}
