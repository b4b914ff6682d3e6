use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::{meter, MeterKind};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ValidateMeterRequest {
    pub identifier: String,
    pub kind: MeterKind,
}

#[derive(Debug, Serialize)]
pub struct ValidateMeterResponse {
    pub identifier: String,
    pub kind: MeterKind,
}

pub async fn validate_meter(
    Json(params): Json<ValidateMeterRequest>,
) -> Result<Json<ValidateMeterResponse>, AppError> {
    let validated = meter::validate(&params.identifier, params.kind)?;
    Ok(Json(ValidateMeterResponse {
        identifier: validated.as_str().to_string(),
        kind: validated.kind(),
    }))
}
