//! Contract lifecycle reconciliation against the external signature
//! workflow.
//!
//! The signature provider drives its own status; this module folds each
//! observed provider status into the contract's signature status and,
//! where the rules say so, advances the lifecycle. Re-applying the same
//! observation never moves state beyond a single application.

use crate::domain::{Contract, ContractStatus, SignStatus};
use chrono::{DateTime, Utc};

/// Signature status as reported by the provider, after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderSignStatus {
    Completed,
    Refused,
    Cancelled,
    Pending,
}

impl ProviderSignStatus {
    /// Normalize a raw provider status string.
    ///
    /// Providers disagree on vocabulary; anything unrecognized is
    /// treated as still pending.
    pub fn from_provider(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" | "signed" => ProviderSignStatus::Completed,
            "refused" | "rejected" => ProviderSignStatus::Refused,
            "cancel" | "cancelled" => ProviderSignStatus::Cancelled,
            _ => ProviderSignStatus::Pending,
        }
    }
}

/// One observation of the provider's view of a signature request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureObservation {
    pub status: ProviderSignStatus,
    /// Provider reference of the newest PDF attachment on the request.
    pub latest_pdf: Option<String>,
    pub observed_at: DateTime<Utc>,
}

/// Fold a provider observation into the contract.
///
/// Returns true when any field changed. Idempotent: folding the same
/// observation again returns false and changes nothing.
pub fn apply_observation(contract: &mut Contract, observation: &SignatureObservation) -> bool {
    let before_status = contract.status;
    let before_sign = contract.sign.clone();

    match observation.status {
        ProviderSignStatus::Completed => {
            if contract.sign.status() != SignStatus::Signed {
                contract.sign.completed_on = Some(observation.observed_at);
            }
            contract.sign.status = Some(SignStatus::Signed);
            if let Some(pdf) = &observation.latest_pdf {
                contract.sign.executed_document = Some(pdf.clone());
            }
            // A late completion never regresses a contract that has
            // already moved past confirmation.
            if matches!(
                contract.status,
                ContractStatus::Draft | ContractStatus::DocPending | ContractStatus::SaleAgreed
            ) {
                contract.status = ContractStatus::Confirmed;
            }
        }
        ProviderSignStatus::Refused => {
            contract.sign.status = Some(SignStatus::Refused);
            if !matches!(
                contract.status,
                ContractStatus::Cancelled | ContractStatus::CotCancelled
            ) {
                contract.status = ContractStatus::Query;
            }
        }
        ProviderSignStatus::Cancelled => {
            // Cancelling the signing step does not cancel the contract.
            contract.sign.status = Some(SignStatus::Cancelled);
        }
        ProviderSignStatus::Pending => {
            contract.sign.status = Some(SignStatus::Pending);
        }
    }

    contract.status != before_status || contract.sign != before_sign
}

/// Everything needed to open a request at the signature provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRequestSpec {
    pub template: String,
    pub signer: String,
    pub reference: String,
}

/// Assemble the provider request for a contract.
///
/// Sending is an explicit action with two prerequisites: a signing
/// template, and a signer (explicit, else the counterparty). Returns
/// None when either is missing; the caller reports failure without
/// raising.
pub fn prepare_signature_request(contract: &Contract) -> Option<SignatureRequestSpec> {
    let template = contract.sign.template.clone()?;
    let signer = contract.effective_signer();
    if signer.is_empty() {
        return None;
    }
    Some(SignatureRequestSpec {
        template,
        signer: signer.to_string(),
        reference: contract.reference.clone(),
    })
}
