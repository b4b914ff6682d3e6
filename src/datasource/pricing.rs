//! HTTP client for the pricing quote API.

use super::{DataSourceError, PricingApi};
use crate::domain::{Decimal, PriceRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// One meter in a quote request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeterPayload {
    pub identifier: String,
    #[serde(rename = "type")]
    pub meter_type: String,
    pub annual_usage_kwh: Decimal,
    pub supply_address: String,
}

/// The wire payload sent to the pricing API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteRequestPayload {
    pub customer: String,
    pub meters: Vec<MeterPayload>,
}

impl QuoteRequestPayload {
    /// Build the payload from a price request's lines.
    pub fn from_request(request: &PriceRequest) -> Self {
        QuoteRequestPayload {
            customer: request.customer.clone(),
            meters: request
                .lines
                .iter()
                .map(|line| MeterPayload {
                    identifier: line.identifier.as_str().to_string(),
                    meter_type: line.meter_type.to_string(),
                    annual_usage_kwh: line.annual_usage_kwh,
                    supply_address: line.supply_address.clone().unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Pricing API client with bearer auth and a bounded timeout.
///
/// No automatic retry: a timeout or transport failure is reported to
/// the caller, who decides whether to try again.
#[derive(Debug, Clone)]
pub struct HttpPricingApi {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpPricingApi {
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
}

#[async_trait]
impl PricingApi for HttpPricingApi {
    async fn fetch_quotes(
        &self,
        payload: &QuoteRequestPayload,
    ) -> Result<serde_json::Value, DataSourceError> {
        let url = format!("{}/pricing/quotes", self.base_url);
        debug!(
            "Requesting quotes for customer={}, meters={}",
            payload.customer,
            payload.meters.len()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
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
            .json::<serde_json::Value>()
            .await
            .map_err(|e| DataSourceError::ParseError(e.to_string()))
    }
}
