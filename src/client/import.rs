//! # HTTP Import Client
//!
//! Single-attempt client for `POST {base_url}/import`. Every call is
//! bounded by the configured timeouts and returns an
//! [`ImportResponseDescriptor`]; nothing here returns a transport error.

use crate::client::payload::ImportRequest;
use crate::client::response::{
    ImportResponseDescriptor, ReceivedResponse, ResponseBody, TransportFailure,
    TransportFailureKind,
};
use crate::config::ImportApiConfig;
use crate::errors::{HarnessError, Result};
use crate::request_span;
use crate::storage::{AvailabilityState, DbRow, QueryFailure, QueryParam};
use crate::validation::{CrossSystemValidator, PersistedRecord, ValidationOutcome};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};

/// Client for the person import endpoint
#[derive(Debug, Clone)]
pub struct ImportClient {
    client: Client,
    config: ImportApiConfig,
    authenticated: bool,
    validator: Option<Arc<CrossSystemValidator>>,
}

impl ImportClient {
    /// Create an authenticated client
    pub fn new(config: ImportApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| HarnessError::Http {
                source: e,
                context: "Failed to create HTTP client".to_string(),
            })?;

        Ok(Self { client, config, authenticated: true, validator: None })
    }

    /// Same client, but requests carry no `Authorization` header
    pub fn without_auth(&self) -> Self {
        Self { authenticated: false, ..self.clone() }
    }

    /// Attach the datastore validator used by the `*_database` helpers
    pub fn with_validator(mut self, validator: Arc<CrossSystemValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn config(&self) -> &ImportApiConfig {
        &self.config
    }

    pub fn import_url(&self) -> String {
        self.config.import_url()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub async fn import_entities(&self, payload: &ImportRequest) -> ImportResponseDescriptor {
        self.send(payload.to_json(), &HeaderMap::new()).await
    }

    /// Import with extra headers. `Content-Type` is always forced to JSON; an
    /// explicit `Authorization` in `headers` replaces the bearer token.
    pub async fn import_entities_with_headers(
        &self,
        payload: &ImportRequest,
        headers: &HeaderMap,
    ) -> ImportResponseDescriptor {
        self.send(payload.to_json(), headers).await
    }

    /// `[{"personId": id}]`
    pub async fn import_person(&self, person_id: i64) -> ImportResponseDescriptor {
        self.import_entities(&ImportRequest::single(person_id)).await
    }

    /// Send an arbitrary JSON body
    pub async fn import_raw(&self, body: Value) -> ImportResponseDescriptor {
        self.send(body, &HeaderMap::new()).await
    }

    async fn send(&self, body: Value, extra_headers: &HeaderMap) -> ImportResponseDescriptor {
        let url = self.config.import_url();
        let span = request_span!("POST", url, authenticated = self.authenticated);

        async {
            let mut headers = extra_headers.clone();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

            let mut request = self.client.post(&url).headers(headers).json(&body);
            if self.authenticated && !extra_headers.contains_key(AUTHORIZATION) {
                request = request.bearer_auth(&self.config.token);
            }

            info!(url = %url, payload = %body, "Sending import request");
            let started = Instant::now();

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => return transport_failure(&e, started.elapsed()),
            };

            let status = response.status();
            let headers = response.headers().clone();
            let raw = match response.text().await {
                Ok(raw) => raw,
                Err(e) => return transport_failure(&e, started.elapsed()),
            };
            let elapsed = started.elapsed();

            let body = ResponseBody::from_text(raw);
            info!(
                status = status.as_u16(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Import response received"
            );
            debug!(body = %body, "Import response body");

            ImportResponseDescriptor::Received(ReceivedResponse { status, body, headers, elapsed })
        }
        .instrument(span)
        .await
    }

    /// Delegates to the cross-system validator; indeterminate without one
    pub async fn validate_person_in_database(&self, person_id: i64) -> ValidationOutcome {
        match &self.validator {
            Some(validator) => validator.validate(person_id).await,
            None => ValidationOutcome::Indeterminate(AvailabilityState::Unconfigured),
        }
    }

    pub async fn get_person_from_database(&self, person_id: i64) -> Option<PersistedRecord> {
        self.validate_person_in_database(person_id).await.into_record()
    }

    /// Ad-hoc query through the datastore gateway
    pub async fn execute_db_query(
        &self,
        query: &str,
        params: &[QueryParam],
    ) -> std::result::Result<Vec<DbRow>, QueryFailure> {
        match &self.validator {
            Some(validator) => validator.gateway().execute_query(query, params).await,
            None => Err(QueryFailure::Unavailable(AvailabilityState::Unconfigured)),
        }
    }
}

fn transport_failure(error: &reqwest::Error, elapsed: Duration) -> ImportResponseDescriptor {
    let kind = TransportFailureKind::classify(error);
    warn!(kind = kind.as_str(), error = %error, "Import request failed before a response");
    ImportResponseDescriptor::TransportFailure(TransportFailure {
        kind,
        reason: error.to_string(),
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_auth_keeps_config() {
        let client = ImportClient::new(ImportApiConfig::default()).unwrap();
        let anonymous = client.without_auth();

        assert!(client.is_authenticated());
        assert!(!anonymous.is_authenticated());
        assert_eq!(anonymous.import_url(), "https://api.test.worldsys.ar/import");
    }

    #[tokio::test]
    async fn test_database_helpers_without_validator() {
        let client = ImportClient::new(ImportApiConfig::default()).unwrap();

        assert!(client.validate_person_in_database(111).await.is_indeterminate());
        assert!(client.get_person_from_database(111).await.is_none());
        assert_eq!(
            client.execute_db_query("SELECT 1", &[]).await.unwrap_err(),
            QueryFailure::Unavailable(AvailabilityState::Unconfigured)
        );
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_failure() {
        let config = ImportApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 2,
            connect_timeout_seconds: 1,
            ..Default::default()
        };
        let client = ImportClient::new(config).unwrap();

        let response = client.import_person(111).await;
        assert!(response.is_transport_failure());
        assert_eq!(response.status(), None);
        assert!(response.elapsed() < Duration::from_secs(5));
    }
}
