//! Signature workflow orchestration: sending contracts out for
//! signature and reconciling provider status back into the lifecycle.

use crate::datasource::{DataSourceError, SignatureProvider};
use crate::db::Repository;
use crate::domain::SignStatus;
use crate::engine::{
    apply_observation, prepare_signature_request, ProviderSignStatus, SignatureObservation,
};
use chrono::Utc;
use futures::future::try_join_all;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SignatureSyncError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error("contract not found: {0}")]
    ContractNotFound(String),
}

/// Result of asking to send a contract for signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// A request was opened at the provider.
    Sent { request_ref: String },
    /// A request already exists; nothing was re-sent.
    AlreadyRequested { request_ref: String },
    /// Template or signer missing; reported, not raised.
    MissingPrerequisites,
}

pub struct SignatureService {
    provider: Arc<dyn SignatureProvider>,
    repo: Arc<Repository>,
}

impl SignatureService {
    pub fn new(provider: Arc<dyn SignatureProvider>, repo: Arc<Repository>) -> Self {
        Self { provider, repo }
    }

    /// Send a contract for signature.
    ///
    /// A no-op reporting failure when the template or signer is missing.
    /// The contract is only touched after the provider call succeeds, so
    /// a transport failure leaves no partial state.
    pub async fn send_for_signature(
        &self,
        reference: &str,
    ) -> Result<SendOutcome, SignatureSyncError> {
        let mut contract = self
            .repo
            .get_contract(reference)
            .await?
            .ok_or_else(|| SignatureSyncError::ContractNotFound(reference.to_string()))?;

        if let Some(request_ref) = contract.sign.request_ref.clone() {
            return Ok(SendOutcome::AlreadyRequested { request_ref });
        }

        let Some(spec) = prepare_signature_request(&contract) else {
            warn!(contract = reference, "Cannot send for signature: template or signer missing");
            return Ok(SendOutcome::MissingPrerequisites);
        };

        let request_ref = self.provider.create_request(&spec).await?;

        contract.sign.request_ref = Some(request_ref.clone());
        contract.sign.status = Some(SignStatus::Pending);
        self.repo.save_contract(&contract).await?;

        info!(
            contract = %contract.display_name(),
            request = %request_ref,
            "Sent contract for signature"
        );
        Ok(SendOutcome::Sent { request_ref })
    }

    /// Poll the provider for one contract and fold the result in.
    ///
    /// Returns true when the contract changed. Idempotent: polling an
    /// unchanged provider status changes nothing.
    pub async fn sync_contract(&self, reference: &str) -> Result<bool, SignatureSyncError> {
        let mut contract = self
            .repo
            .get_contract(reference)
            .await?
            .ok_or_else(|| SignatureSyncError::ContractNotFound(reference.to_string()))?;

        let Some(request_ref) = contract.sign.request_ref.clone() else {
            return Ok(false);
        };

        let raw_status = self.provider.fetch_status(&request_ref).await?;
        let status = ProviderSignStatus::from_provider(&raw_status);

        // The executed document is only needed once signing completed.
        let latest_pdf = if status == ProviderSignStatus::Completed {
            self.provider.latest_pdf(&request_ref).await?
        } else {
            None
        };

        let changed = apply_observation(
            &mut contract,
            &SignatureObservation {
                status,
                latest_pdf,
                observed_at: Utc::now(),
            },
        );

        if changed {
            self.repo.save_contract(&contract).await?;
            info!(
                contract = reference,
                status = %raw_status,
                "Signature status reconciled"
            );
        }

        Ok(changed)
    }

    /// Poll every contract with an open signature request.
    ///
    /// Returns (contracts checked, contracts changed).
    pub async fn sync_all(&self) -> Result<(usize, usize), SignatureSyncError> {
        let contracts = self.repo.list_contracts_with_sign_requests().await?;
        let checked = contracts.len();

        let results = try_join_all(
            contracts
                .iter()
                .map(|c| self.sync_contract(&c.reference)),
        )
        .await?;

        let changed = results.into_iter().filter(|c| *c).count();
        Ok((checked, changed))
    }
}
