use axum::extract::{Path, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{
    CommissionFigures, CommissionRule, Contract, ContractStatus, ContractType, Decimal,
    LedgerSide, ReconciliationLedger, ReconciliationLine,
};
use crate::engine;
use crate::error::AppError;
use crate::orchestration::SendOutcome;

/// Commission figures rendered as canonical strings.
#[derive(Debug, Serialize)]
pub struct CommissionFiguresResponse {
    pub supplier_commission: String,
    pub full_commission: String,
    pub commission_first_payment: String,
    pub commission_amount_total: String,
    pub commission_to_pay: String,
}

impl From<CommissionFigures> for CommissionFiguresResponse {
    fn from(figures: CommissionFigures) -> Self {
        Self {
            supplier_commission: figures.supplier_commission.to_canonical_string(),
            full_commission: figures.full_commission.to_canonical_string(),
            commission_first_payment: figures.commission_first_payment.to_canonical_string(),
            commission_amount_total: figures.commission_amount_total.to_canonical_string(),
            commission_to_pay: figures.commission_to_pay.to_canonical_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateContractRequest {
    pub reference: String,
    pub customer: String,
    pub supplier: String,
    pub contract_type: ContractType,
    pub unit_rate_p_per_kwh: Option<Decimal>,
    pub standing_charge_gbp_per_day: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub price_response_ref: Option<String>,
    pub total_usage_kwh: Option<Decimal>,
    pub uplift_p_per_kwh: Option<Decimal>,
    pub sign_template: Option<String>,
    pub signer: Option<String>,
}

pub async fn create_contract(
    State(state): State<AppState>,
    Json(params): Json<CreateContractRequest>,
) -> Result<Json<Contract>, AppError> {
    let mut contract = Contract::new(
        params.reference,
        params.customer,
        params.supplier,
        params.contract_type,
    );
    contract.unit_rate_p_per_kwh = params.unit_rate_p_per_kwh.unwrap_or_default();
    contract.standing_charge_gbp_per_day = params.standing_charge_gbp_per_day.unwrap_or_default();
    contract.start_date = params.start_date;
    contract.end_date = params.end_date;
    contract.price_response_ref = params.price_response_ref;
    contract.total_usage_kwh = params.total_usage_kwh.unwrap_or_default();
    contract.sign.template = params.sign_template;
    contract.sign.signer = params.signer;

    if let Some(uplift) = params.uplift_p_per_kwh {
        engine::check_uplift(uplift, &state.config.pricing_config())?;
        contract.uplift_p_per_kwh = uplift;
    }

    // Figures are derived before the row exists, so the ledger is empty
    // by construction.
    contract.figures = engine::derive_for_contract(&contract, &ReconciliationLedger::new());

    state.repo.insert_contract(&contract).await?;
    Ok(Json(contract))
}

pub async fn get_contract(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<Contract>, AppError> {
    let contract = state
        .repo
        .get_contract(&reference)
        .await?
        .ok_or_else(|| AppError::NotFound(reference))?;
    Ok(Json(contract))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Json(params): Json<SetStatusRequest>,
) -> Result<Json<Contract>, AppError> {
    let to = ContractStatus::parse(&params.status)
        .ok_or_else(|| AppError::BadRequest(format!("unknown status: {}", params.status)))?;

    let mut contract = state
        .repo
        .get_contract(&reference)
        .await?
        .ok_or_else(|| AppError::NotFound(reference))?;

    if !contract.status.can_transition(to) {
        return Err(AppError::Validation(format!(
            "illegal transition from {} to {}",
            contract.status, to
        )));
    }

    contract.status = to;
    state.repo.save_contract(&contract).await?;
    Ok(Json(contract))
}

#[derive(Debug, Deserialize)]
pub struct SetRuleRequest {
    pub rule: Option<CommissionRule>,
}

pub async fn set_rule(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Json(params): Json<SetRuleRequest>,
) -> Result<Json<CommissionFiguresResponse>, AppError> {
    let figures = state.commission.set_rule(&reference, params.rule).await?;
    Ok(Json(figures.into()))
}

#[derive(Debug, Deserialize)]
pub struct SetUpliftRequest {
    pub uplift_p_per_kwh: Decimal,
}

pub async fn set_uplift(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Json(params): Json<SetUpliftRequest>,
) -> Result<Json<CommissionFiguresResponse>, AppError> {
    let figures = state
        .commission
        .set_uplift(
            &reference,
            params.uplift_p_per_kwh,
            &state.config.pricing_config(),
        )
        .await?;
    Ok(Json(figures.into()))
}

#[derive(Debug, Deserialize)]
pub struct AppendReconciliationRequest {
    pub side: LedgerSide,
    /// Defaults to today.
    pub date: Option<NaiveDate>,
    pub amount: Decimal,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AppendReconciliationResponse {
    pub inserted: bool,
    pub figures: CommissionFiguresResponse,
}

pub async fn append_reconciliation(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Json(params): Json<AppendReconciliationRequest>,
) -> Result<Json<AppendReconciliationResponse>, AppError> {
    let line = ReconciliationLine::new(
        reference,
        params.side,
        params.date.unwrap_or_else(|| Utc::now().date_naive()),
        params.amount,
        params.note,
    );

    let (inserted, figures) = state.commission.append_line(&line).await?;
    Ok(Json(AppendReconciliationResponse {
        inserted,
        figures: figures.into(),
    }))
}

#[derive(Debug, Serialize)]
pub struct SendForSignatureResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_ref: Option<String>,
}

pub async fn send_for_signature(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<SendForSignatureResponse>, AppError> {
    let response = match state.signature.send_for_signature(&reference).await? {
        SendOutcome::Sent { request_ref } => SendForSignatureResponse {
            outcome: "sent",
            request_ref: Some(request_ref),
        },
        SendOutcome::AlreadyRequested { request_ref } => SendForSignatureResponse {
            outcome: "already_requested",
            request_ref: Some(request_ref),
        },
        SendOutcome::MissingPrerequisites => SendForSignatureResponse {
            outcome: "missing_prerequisites",
            request_ref: None,
        },
    };
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct SyncSignatureResponse {
    pub changed: bool,
}

pub async fn sync_signature(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<SyncSignatureResponse>, AppError> {
    let changed = state.signature.sync_contract(&reference).await?;
    Ok(Json(SyncSignatureResponse { changed }))
}

#[derive(Debug, Serialize)]
pub struct SyncAllSignaturesResponse {
    pub checked: usize,
    pub changed: usize,
}

pub async fn sync_all_signatures(
    State(state): State<AppState>,
) -> Result<Json<SyncAllSignaturesResponse>, AppError> {
    let (checked, changed) = state.signature.sync_all().await?;
    Ok(Json(SyncAllSignaturesResponse { checked, changed }))
}
