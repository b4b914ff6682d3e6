use axum::extract::{Path, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::api::AppState;
use crate::domain::Authorization;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateAuthorizationRequest {
    pub reference: String,
    pub customer: String,
    /// Defaults to today.
    pub issue_date: Option<NaiveDate>,
}

pub async fn create_authorization(
    State(state): State<AppState>,
    Json(params): Json<CreateAuthorizationRequest>,
) -> Result<Json<Authorization>, AppError> {
    let issue_date = params.issue_date.unwrap_or_else(|| Utc::now().date_naive());
    let loa = Authorization::new(params.reference, params.customer, issue_date);
    state.repo.upsert_authorization(&loa).await?;
    Ok(Json(loa))
}

#[derive(Debug, Default, Deserialize)]
pub struct ValidateAuthorizationRequest {
    /// Defaults to today; explicit for deterministic sweeps and tests.
    pub today: Option<NaiveDate>,
}

pub async fn validate_authorization(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    params: Option<Json<ValidateAuthorizationRequest>>,
) -> Result<Json<Authorization>, AppError> {
    let today = params
        .and_then(|Json(p)| p.today)
        .unwrap_or_else(|| Utc::now().date_naive());

    let mut loa = state
        .repo
        .get_authorization(&reference)
        .await?
        .ok_or_else(|| AppError::NotFound(reference.clone()))?;

    loa.validate(today)?;
    state.repo.upsert_authorization(&loa).await?;
    Ok(Json(loa))
}
