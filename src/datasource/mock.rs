//! Mock datasources for testing without network calls.

use super::{DataSourceError, PricingApi, QuoteRequestPayload, SignatureProvider};
use crate::engine::SignatureRequestSpec;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Mock pricing API returning a predefined response payload.
#[derive(Debug, Default)]
pub struct MockPricingApi {
    response: Option<serde_json::Value>,
    fail_with_timeout: bool,
}

impl MockPricingApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to every request with this payload.
    pub fn with_response(mut self, response: serde_json::Value) -> Self {
        self.response = Some(response);
        self
    }

    /// Fail every request with a timeout.
    pub fn failing_with_timeout(mut self) -> Self {
        self.fail_with_timeout = true;
        self
    }
}

#[async_trait]
impl PricingApi for MockPricingApi {
    async fn fetch_quotes(
        &self,
        _payload: &QuoteRequestPayload,
    ) -> Result<serde_json::Value, DataSourceError> {
        if self.fail_with_timeout {
            return Err(DataSourceError::Timeout);
        }
        Ok(self
            .response
            .clone()
            .unwrap_or_else(|| serde_json::json!({"offers": []})))
    }
}

/// Mock signature provider with scripted statuses and documents.
#[derive(Debug, Default)]
pub struct MockSignatureProvider {
    statuses: HashMap<String, String>,
    pdfs: HashMap<String, String>,
    next_ref: Option<String>,
    fail_creates: bool,
    created: Mutex<Vec<SignatureRequestSpec>>,
}

impl MockSignatureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference returned by the next `create_request`.
    pub fn with_next_ref(mut self, request_ref: impl Into<String>) -> Self {
        self.next_ref = Some(request_ref.into());
        self
    }

    /// Status string returned for a request reference.
    pub fn with_status(mut self, request_ref: impl Into<String>, status: impl Into<String>) -> Self {
        self.statuses.insert(request_ref.into(), status.into());
        self
    }

    /// Newest PDF reference returned for a request reference.
    pub fn with_pdf(mut self, request_ref: impl Into<String>, pdf: impl Into<String>) -> Self {
        self.pdfs.insert(request_ref.into(), pdf.into());
        self
    }

    /// Fail every `create_request` with a network error.
    pub fn failing_creates(mut self) -> Self {
        self.fail_creates = true;
        self
    }

    /// Specs passed to `create_request` so far.
    pub fn created_requests(&self) -> Vec<SignatureRequestSpec> {
        self.created.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl SignatureProvider for MockSignatureProvider {
    async fn create_request(&self, spec: &SignatureRequestSpec) -> Result<String, DataSourceError> {
        if self.fail_creates {
            return Err(DataSourceError::NetworkError("mock failure".to_string()));
        }
        self.created
            .lock()
            .expect("mock lock poisoned")
            .push(spec.clone());
        Ok(self
            .next_ref
            .clone()
            .unwrap_or_else(|| format!("sig-{}", uuid::Uuid::new_v4())))
    }

    async fn fetch_status(&self, request_ref: &str) -> Result<String, DataSourceError> {
        Ok(self
            .statuses
            .get(request_ref)
            .cloned()
            .unwrap_or_else(|| "pending".to_string()))
    }

    async fn latest_pdf(&self, request_ref: &str) -> Result<Option<String>, DataSourceError> {
        Ok(self.pdfs.get(request_ref).cloned())
    }
}
