use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// User-correctable input problem; shown verbatim.
    #[error("{0}")]
    Validation(String),
    /// External dependency failure; the triggering action was aborted
    /// with no partial state persisted.
    #[error("Upstream service failure: {0}")]
    Integration(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crate::domain::MeterValidationError> for AppError {
    fn from(err: crate::domain::MeterValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<crate::domain::AuthorizationError> for AppError {
    fn from(err: crate::domain::AuthorizationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<crate::engine::PricingError> for AppError {
    fn from(err: crate::engine::PricingError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<crate::datasource::DataSourceError> for AppError {
    fn from(err: crate::datasource::DataSourceError) -> Self {
        AppError::Integration(err.to_string())
    }
}

impl From<crate::orchestration::QuoteError> for AppError {
    fn from(err: crate::orchestration::QuoteError) -> Self {
        use crate::orchestration::QuoteError;
        match err {
            QuoteError::Authorization(e) => AppError::Validation(e.to_string()),
            QuoteError::Pricing(e) => AppError::Validation(e.to_string()),
            QuoteError::MissingCustomerEmail => {
                AppError::Validation(QuoteError::MissingCustomerEmail.to_string())
            }
            QuoteError::DataSource(e) => AppError::Integration(e.to_string()),
            QuoteError::Csv(e) => AppError::Internal(e),
        }
    }
}

impl From<crate::orchestration::SignatureSyncError> for AppError {
    fn from(err: crate::orchestration::SignatureSyncError) -> Self {
        use crate::orchestration::SignatureSyncError;
        match err {
            SignatureSyncError::ContractNotFound(r) => AppError::NotFound(r),
            SignatureSyncError::DataSource(e) => AppError::Integration(e.to_string()),
            SignatureSyncError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<crate::orchestration::CommissionError> for AppError {
    fn from(err: crate::orchestration::CommissionError) -> Self {
        use crate::orchestration::CommissionError;
        match err {
            CommissionError::ContractNotFound(r) => AppError::NotFound(r),
            CommissionError::RuleOutOfRange => {
                AppError::Validation(CommissionError::RuleOutOfRange.to_string())
            }
            CommissionError::Uplift(e) => AppError::Validation(e.to_string()),
            CommissionError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Integration(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
