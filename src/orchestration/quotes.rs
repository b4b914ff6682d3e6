//! Quote collection: turn an authorized price request into a priced
//! supplier response.

use crate::datasource::{map_offers, PricingApi, QuoteRequestPayload};
use crate::domain::{Authorization, AuthorizationError, PriceRequest, PriceResponse};
use crate::engine::{price_line, PricingConfig, PricingError};
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    DataSource(#[from] crate::datasource::DataSourceError),
    #[error("customer email is required to send a quotation comparison")]
    MissingCustomerEmail,
    #[error("csv error: {0}")]
    Csv(String),
}

/// Collects quotes from the pricing API for an authorized request.
pub struct QuoteCollector {
    pricing: Arc<dyn PricingApi>,
    config: PricingConfig,
}

impl QuoteCollector {
    pub fn new(pricing: Arc<dyn PricingApi>, config: PricingConfig) -> Self {
        Self { pricing, config }
    }

    /// Fetch offers for every meter on the request and price the matches.
    ///
    /// Requires a valid, unexpired authorization. The configured default
    /// uplift is applied to each priced line. Malformed or unmatched
    /// offers are dropped individually; a response is created even when
    /// no offer mapped.
    ///
    /// # Errors
    /// Fails on an unusable authorization, an API failure (nothing is
    /// persisted), or a default uplift above the configured maximum.
    pub async fn collect(
        &self,
        request: &PriceRequest,
        authorization: &Authorization,
        supplier: &str,
        today: NaiveDate,
    ) -> Result<PriceResponse, QuoteError> {
        authorization.ensure_usable(today)?;

        let payload = QuoteRequestPayload::from_request(request);
        let response_json = self.pricing.fetch_quotes(&payload).await?;

        let matched = map_offers(&response_json, &request.lines);
        info!(
            request = %request.reference,
            offers = matched.len(),
            lines = request.lines.len(),
            "Mapped pricing API offers"
        );

        let mut response = PriceResponse::new(supplier);
        for m in matched {
            let line = &request.lines[m.line_index];
            response.lines.push(price_line(
                line.identifier.clone(),
                m.offer.to_quote(),
                line.annual_usage_kwh,
                self.config.default_uplift_p_per_kwh,
                &self.config,
            )?);
        }

        Ok(response)
    }
}

/// Tender CSV header, one row per request line below it.
const TENDER_CSV_HEADER: [&str; 6] = [
    "MPAN/MPRN",
    "Annual Usage (kWh)",
    "Current Supplier",
    "Contract End",
    "Meter Type",
    "Supply Address",
];

/// Serialize a request's meter list for tendering to suppliers.
pub fn tender_csv(request: &PriceRequest) -> Result<String, QuoteError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(TENDER_CSV_HEADER)
        .map_err(|e| QuoteError::Csv(e.to_string()))?;

    for line in &request.lines {
        writer
            .write_record([
                line.identifier.as_str(),
                &line.annual_usage_kwh.to_canonical_string(),
                line.current_supplier.as_deref().unwrap_or(""),
                &line
                    .contract_end_date
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                &line.meter_type.to_string(),
                line.supply_address.as_deref().unwrap_or(""),
            ])
            .map_err(|e| QuoteError::Csv(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| QuoteError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| QuoteError::Csv(e.to_string()))
}

/// A comparison can only go to a customer with an email address.
pub fn ensure_comparison_sendable(request: &PriceRequest) -> Result<(), QuoteError> {
    match &request.customer_email {
        Some(email) if !email.trim().is_empty() => Ok(()),
        _ => Err(QuoteError::MissingCustomerEmail),
    }
}
