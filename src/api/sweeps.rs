use axum::extract::State;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct ExpirySweepRequest {
    /// Defaults to today; explicit for deterministic runs and tests.
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct ReminderResponse {
    pub contract_reference: String,
    pub days_until_end: i64,
}

#[derive(Debug, Serialize)]
pub struct ExpirySweepResponse {
    pub authorizations_expired: usize,
    pub alerts_updated: usize,
    pub reminders: Vec<ReminderResponse>,
}

pub async fn run_expiry_sweep(
    State(state): State<AppState>,
    params: Option<Json<ExpirySweepRequest>>,
) -> Result<Json<ExpirySweepResponse>, AppError> {
    let today = params
        .and_then(|Json(p)| p.today)
        .unwrap_or_else(|| Utc::now().date_naive());

    let report = state.sweeps.run(today).await?;
    Ok(Json(ExpirySweepResponse {
        authorizations_expired: report.authorizations_expired,
        alerts_updated: report.alerts_updated,
        reminders: report
            .reminders
            .into_iter()
            .map(|r| ReminderResponse {
                contract_reference: r.contract_reference,
                days_until_end: r.days_until_end,
            })
            .collect(),
    }))
}
