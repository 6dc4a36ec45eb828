//! Normalized import response.
//!
//! Every call produces an [`ImportResponseDescriptor`]; transport failures
//! are a variant, not an error, so assertions always inspect one shape.

use http::{HeaderMap, StatusCode};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Status codes the import endpoint uses for success
pub const SUCCESS_STATUSES: [u16; 3] = [200, 201, 202];

/// Parsed response body
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    /// Non-empty body that is not JSON
    Unparseable { raw: String, error: String },
    Empty,
}

impl ResponseBody {
    pub fn from_text(raw: String) -> Self {
        if raw.trim().is_empty() {
            return ResponseBody::Empty;
        }
        match serde_json::from_str(&raw) {
            Ok(value) => ResponseBody::Json(value),
            Err(e) => ResponseBody::Unparseable { raw, error: e.to_string() },
        }
    }

    pub fn json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Json(value) => write!(f, "{}", value),
            ResponseBody::Unparseable { raw, .. } => f.write_str(raw),
            ResponseBody::Empty => f.write_str("<empty>"),
        }
    }
}

/// A response the service actually sent
#[derive(Debug, Clone)]
pub struct ReceivedResponse {
    pub status: StatusCode,
    pub body: ResponseBody,
    pub headers: HeaderMap,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailureKind {
    Timeout,
    Connect,
    /// Request could not be built or sent
    Request,
    /// Response body could not be read
    Body,
}

impl TransportFailureKind {
    pub fn classify(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportFailureKind::Timeout
        } else if error.is_connect() {
            TransportFailureKind::Connect
        } else if error.is_body() || error.is_decode() {
            TransportFailureKind::Body
        } else {
            TransportFailureKind::Request
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportFailureKind::Timeout => "timeout",
            TransportFailureKind::Connect => "connect",
            TransportFailureKind::Request => "request",
            TransportFailureKind::Body => "body",
        }
    }
}

/// No response was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct TransportFailure {
    pub kind: TransportFailureKind,
    pub reason: String,
    pub elapsed: Duration,
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure after {:?}: {}", self.kind.as_str(), self.elapsed, self.reason)
    }
}

/// Outcome of one import call
#[derive(Debug, Clone)]
pub enum ImportResponseDescriptor {
    Received(ReceivedResponse),
    TransportFailure(TransportFailure),
}

impl ImportResponseDescriptor {
    /// HTTP status, `None` on transport failure
    pub fn status(&self) -> Option<u16> {
        match self {
            ImportResponseDescriptor::Received(response) => Some(response.status.as_u16()),
            ImportResponseDescriptor::TransportFailure(_) => None,
        }
    }

    /// 200, 201 or 202
    pub fn is_success(&self) -> bool {
        self.status_in(&SUCCESS_STATUSES)
    }

    pub fn has_status(&self, code: u16) -> bool {
        self.status() == Some(code)
    }

    pub fn status_in(&self, codes: &[u16]) -> bool {
        self.status().is_some_and(|status| codes.contains(&status))
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|status| (400..500).contains(&status))
    }

    pub fn body(&self) -> Option<&ResponseBody> {
        match self {
            ImportResponseDescriptor::Received(response) => Some(&response.body),
            ImportResponseDescriptor::TransportFailure(_) => None,
        }
    }

    pub fn json(&self) -> Option<&Value> {
        self.body().and_then(ResponseBody::json)
    }

    /// Header value by name, case-insensitive; `None` if absent or not UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        match self {
            ImportResponseDescriptor::Received(response) => {
                response.headers.get(name).and_then(|value| value.to_str().ok())
            }
            ImportResponseDescriptor::TransportFailure(_) => None,
        }
    }

    /// Wall-clock time around the call, populated in both variants
    pub fn elapsed(&self) -> Duration {
        match self {
            ImportResponseDescriptor::Received(response) => response.elapsed,
            ImportResponseDescriptor::TransportFailure(failure) => failure.elapsed,
        }
    }

    pub fn failure(&self) -> Option<&TransportFailure> {
        match self {
            ImportResponseDescriptor::TransportFailure(failure) => Some(failure),
            ImportResponseDescriptor::Received(_) => None,
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        self.failure().is_some()
    }
}

impl fmt::Display for ImportResponseDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportResponseDescriptor::Received(response) => write!(
                f,
                "HTTP {} in {:?}: {}",
                response.status.as_u16(),
                response.elapsed,
                response.body
            ),
            ImportResponseDescriptor::TransportFailure(failure) => fmt::Display::fmt(failure, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderValue, CONTENT_TYPE};
    use serde_json::json;

    fn received(status: u16, body: &str) -> ImportResponseDescriptor {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        ImportResponseDescriptor::Received(ReceivedResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: ResponseBody::from_text(body.to_string()),
            headers,
            elapsed: Duration::from_millis(12),
        })
    }

    #[test]
    fn test_body_parsing() {
        assert_eq!(ResponseBody::from_text("  ".to_string()), ResponseBody::Empty);
        assert_eq!(
            ResponseBody::from_text(r#"{"status":"success"}"#.to_string()),
            ResponseBody::Json(json!({"status": "success"}))
        );
        assert!(matches!(
            ResponseBody::from_text("<html>".to_string()),
            ResponseBody::Unparseable { .. }
        ));
    }

    #[test]
    fn test_success_statuses() {
        for status in SUCCESS_STATUSES {
            assert!(received(status, "").is_success());
        }
        assert!(!received(204, "").is_success());
        assert!(!received(400, "").is_success());
        assert!(received(400, "").is_client_error());
        assert!(received(401, "").status_in(&[400, 401]));
    }

    #[test]
    fn test_accessors_on_received() {
        let response = received(200, r#"{"personId":111}"#);
        assert_eq!(response.status(), Some(200));
        assert!(response.has_status(200));
        assert_eq!(response.json().unwrap()["personId"], 111);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.elapsed(), Duration::from_millis(12));
        assert!(response.failure().is_none());
    }

    #[test]
    fn test_accessors_on_transport_failure() {
        let response = ImportResponseDescriptor::TransportFailure(TransportFailure {
            kind: TransportFailureKind::Connect,
            reason: "connection refused".to_string(),
            elapsed: Duration::from_millis(3),
        });
        assert_eq!(response.status(), None);
        assert!(!response.is_success());
        assert!(!response.is_client_error());
        assert!(response.json().is_none());
        assert!(response.header("content-type").is_none());
        assert_eq!(response.elapsed(), Duration::from_millis(3));
        assert_eq!(response.to_string(), "connect failure after 3ms: connection refused");
    }
}
