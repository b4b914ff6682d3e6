use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{Decimal, MeterType, PriceRequest, PriceResponse, RequestLine, TariffQuote};
use crate::engine;
use crate::error::AppError;
use crate::orchestration::{ensure_comparison_sendable, tender_csv};

#[derive(Debug, Deserialize)]
pub struct LineInput {
    pub identifier: String,
    pub meter_type: MeterType,
    pub annual_usage_kwh: Decimal,
    pub supply_address: Option<String>,
    pub current_supplier: Option<String>,
    pub contract_end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct RequestInput {
    pub reference: String,
    pub customer: String,
    pub customer_email: Option<String>,
    pub lines: Vec<LineInput>,
}

impl RequestInput {
    fn into_domain(self) -> Result<PriceRequest, AppError> {
        let mut request = PriceRequest::new(self.reference, self.customer);
        request.customer_email = self.customer_email;
        for line in self.lines {
            let mut domain_line =
                RequestLine::new(&line.identifier, line.meter_type, line.annual_usage_kwh)?;
            domain_line.supply_address = line.supply_address;
            domain_line.current_supplier = line.current_supplier;
            domain_line.contract_end_date = line.contract_end_date;
            request.lines.push(domain_line);
        }
        Ok(request)
    }
}

#[derive(Debug, Deserialize)]
pub struct PriceQuoteRequest {
    pub unit_rate_p_per_kwh: Decimal,
    pub standing_charge_gbp_per_day: Decimal,
    pub annual_usage_kwh: Decimal,
    pub uplift_p_per_kwh: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct PriceQuoteResponse {
    pub annual_cost: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_rate_with_uplift_p_per_kwh: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_cost_with_uplift: Option<String>,
}

/// Price a single tariff without touching any stored record.
pub async fn price_quote(
    State(state): State<AppState>,
    Json(params): Json<PriceQuoteRequest>,
) -> Result<Json<PriceQuoteResponse>, AppError> {
    let annual_cost = engine::annual_cost(
        params.unit_rate_p_per_kwh,
        params.standing_charge_gbp_per_day,
        params.annual_usage_kwh,
    );

    let mut response = PriceQuoteResponse {
        annual_cost: annual_cost.to_canonical_string(),
        unit_rate_with_uplift_p_per_kwh: None,
        annual_cost_with_uplift: None,
    };

    if let Some(uplift) = params.uplift_p_per_kwh {
        engine::check_uplift(uplift, &state.config.pricing_config())?;
        let quote = TariffQuote::new(
            params.unit_rate_p_per_kwh,
            params.standing_charge_gbp_per_day,
        );
        let uplifted = engine::price_with_uplift(&quote, uplift, params.annual_usage_kwh);
        response.unit_rate_with_uplift_p_per_kwh = Some(
            uplifted
                .unit_rate_with_uplift_p_per_kwh
                .to_canonical_string(),
        );
        response.annual_cost_with_uplift = Some(uplifted.annual_cost.to_canonical_string());
    }

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct CollectQuotesRequest {
    pub authorization: String,
    pub supplier: String,
    pub request: RequestInput,
}

/// Collect and price offers from the pricing API for an authorized
/// request.
pub async fn collect_quotes(
    State(state): State<AppState>,
    Json(params): Json<CollectQuotesRequest>,
) -> Result<Json<PriceResponse>, AppError> {
    let authorization = state
        .repo
        .get_authorization(&params.authorization)
        .await?
        .ok_or_else(|| AppError::NotFound(params.authorization.clone()))?;

    let request = params.request.into_domain()?;
    let today = Utc::now().date_naive();

    let response = state
        .quotes
        .collect(&request, &authorization, &params.supplier, today)
        .await?;

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct TenderRequest {
    pub request: RequestInput,
}

/// Export a request's meter list as tender CSV.
pub async fn tender(Json(params): Json<TenderRequest>) -> Result<impl IntoResponse, AppError> {
    let request = params.request.into_domain()?;
    let csv = tender_csv(&request)?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], csv))
}

#[derive(Debug, Deserialize)]
pub struct ComparisonRequest {
    pub request: RequestInput,
    pub responses: Vec<PriceResponse>,
}

#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub customer: String,
    pub customer_email: String,
    pub responses: Vec<PriceResponse>,
}

/// Finalize a comparison across supplier responses.
///
/// Marks the cheapest response as the best offer. Requires the customer
/// email the comparison will be sent to.
pub async fn finalize_comparison(
    Json(params): Json<ComparisonRequest>,
) -> Result<Json<ComparisonResponse>, AppError> {
    let request = params.request.into_domain()?;
    ensure_comparison_sendable(&request)?;

    let mut responses = params.responses;
    let best = responses
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.lines.is_empty())
        .min_by_key(|(_, r)| r.total_annual_cost())
        .map(|(i, _)| i);

    for (i, response) in responses.iter_mut().enumerate() {
        response.is_best_offer = Some(i) == best;
    }

    Ok(Json(ComparisonResponse {
        customer: request.customer.clone(),
        customer_email: request.customer_email.clone().unwrap_or_default(),
        responses,
    }))
}
