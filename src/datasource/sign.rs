//! HTTP client for the e-signature provider.

use super::{DataSourceError, SignatureProvider};
use crate::engine::SignatureRequestSpec;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Signature provider client with a bounded timeout and no retry.
#[derive(Debug, Clone)]
pub struct HttpSignatureProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpSignatureProvider {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, DataSourceError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DataSourceError::Timeout
                } else {
                    DataSourceError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataSourceError::HttpError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| DataSourceError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl SignatureProvider for HttpSignatureProvider {
    async fn create_request(&self, spec: &SignatureRequestSpec) -> Result<String, DataSourceError> {
        let url = format!("{}/sign/requests", self.base_url);
        debug!(
            "Creating signature request for {} (template {})",
            spec.reference, spec.template
        );

        let body = serde_json::json!({
            "template": spec.template,
            "reference": spec.reference,
            // The provider assigns its first defined role to this signer.
            "signer": spec.signer,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DataSourceError::Timeout
                } else {
                    DataSourceError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataSourceError::HttpError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| DataSourceError::ParseError(e.to_string()))?;

        value
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DataSourceError::ParseError("missing request id".to_string()))
    }

    async fn fetch_status(&self, request_ref: &str) -> Result<String, DataSourceError> {
        let url = format!("{}/sign/requests/{}", self.base_url, request_ref);
        let value = self.get_json(&url).await?;
        Ok(value
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn latest_pdf(&self, request_ref: &str) -> Result<Option<String>, DataSourceError> {
        let url = format!("{}/sign/requests/{}/documents", self.base_url, request_ref);
        let value = self.get_json(&url).await?;
        Ok(newest_pdf_reference(&value))
    }
}

/// Pick the newest PDF attachment reference from a documents payload.
///
/// Documents carry a monotonically increasing `id`; the highest id
/// among PDF-typed entries is the newest.
fn newest_pdf_reference(payload: &Value) -> Option<String> {
    let documents = payload
        .get("documents")
        .and_then(Value::as_array)
        .or_else(|| payload.as_array())?;

    documents
        .iter()
        .filter(|doc| {
            doc.get("mimetype")
                .and_then(Value::as_str)
                .map(|m| m.to_ascii_lowercase().contains("pdf"))
                .unwrap_or(false)
        })
        .max_by_key(|doc| doc.get("id").and_then(Value::as_i64).unwrap_or(i64::MIN))
        .and_then(|doc| doc.get("reference").and_then(Value::as_str))
        .map(str::to_string)
}
