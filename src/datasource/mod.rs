//! External boundaries: the pricing quote API and the e-signature
//! provider.
//!
//! Both are blocking network dependencies with bounded timeouts and no
//! automatic retry; a failed call surfaces a failure signal and leaves
//! no partial state behind.

use crate::engine::SignatureRequestSpec;
use async_trait::async_trait;
use std::fmt;

pub mod mock;
pub mod offers;
pub mod pricing;
pub mod sign;

pub use mock::{MockPricingApi, MockSignatureProvider};
pub use offers::{extract_offers, map_offers, parse_offer, MatchedOffer, Offer};
pub use pricing::{HttpPricingApi, MeterPayload, QuoteRequestPayload};
pub use sign::HttpSignatureProvider;

/// Client for the external pricing quote API.
#[async_trait]
pub trait PricingApi: Send + Sync + fmt::Debug {
    /// Request quotes for a set of meters.
    ///
    /// The response is free-form JSON; callers run it through the
    /// offer-shape adapter rather than deserializing a fixed schema.
    async fn fetch_quotes(
        &self,
        payload: &QuoteRequestPayload,
    ) -> Result<serde_json::Value, DataSourceError>;
}

/// Client for the external e-signature provider.
#[async_trait]
pub trait SignatureProvider: Send + Sync + fmt::Debug {
    /// Open a signature request, assigning the first defined role to the
    /// signer. Returns the provider's request reference.
    async fn create_request(&self, spec: &SignatureRequestSpec) -> Result<String, DataSourceError>;

    /// Current raw status string for a request, in the provider's own
    /// vocabulary.
    async fn fetch_status(&self, request_ref: &str) -> Result<String, DataSourceError>;

    /// Reference of the newest PDF-typed attachment on a request, if any.
    async fn latest_pdf(&self, request_ref: &str) -> Result<Option<String>, DataSourceError>;
}

/// Error type for external calls.
#[derive(Debug, Clone)]
pub enum DataSourceError {
    /// Connection failure, DNS failure, TLS failure.
    NetworkError(String),
    /// The call exceeded its bounded timeout.
    Timeout,
    /// Non-success HTTP response.
    HttpError { status: u16, message: String },
    /// Invalid JSON or malformed response body.
    ParseError(String),
    /// Other error.
    Other(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::Timeout => write!(f, "Request timed out"),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}
