//! Commission recomputation: every change to an input re-runs the
//! derivation chain and commits the whole snapshot at once.

use crate::db::Repository;
use crate::domain::{CommissionFigures, CommissionRule, Decimal, ReconciliationLine};
use crate::engine::{check_uplift, derive_for_contract, PricingConfig, PricingError};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CommissionError {
    #[error("contract not found: {0}")]
    ContractNotFound(String),
    #[error("commission rule percentages must be between 0 and 100")]
    RuleOutOfRange,
    #[error(transparent)]
    Uplift(#[from] PricingError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

pub struct CommissionService {
    repo: Arc<Repository>,
}

impl CommissionService {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Re-derive and persist a contract's commission figures from its
    /// current inputs and ledger.
    pub async fn recompute(&self, reference: &str) -> Result<CommissionFigures, CommissionError> {
        let mut contract = self
            .repo
            .get_contract(reference)
            .await?
            .ok_or_else(|| CommissionError::ContractNotFound(reference.to_string()))?;

        let ledger = self.repo.ledger_for_contract(reference).await?;
        contract.figures = derive_for_contract(&contract, &ledger);
        self.repo.save_contract(&contract).await?;

        info!(
            contract = reference,
            supplier_commission = %contract.figures.supplier_commission,
            commission_to_pay = %contract.figures.commission_to_pay,
            "Commission figures recomputed"
        );
        Ok(contract.figures)
    }

    /// Replace (or clear) the contract's commission rule and recompute.
    ///
    /// Exactly one rule applies at a time; changing it invalidates every
    /// derived figure.
    ///
    /// # Errors
    /// Rejects rules with percentages outside [0,100] before anything is
    /// persisted.
    pub async fn set_rule(
        &self,
        reference: &str,
        rule: Option<CommissionRule>,
    ) -> Result<CommissionFigures, CommissionError> {
        if let Some(rule) = &rule {
            if !rule.percentages_in_range() {
                return Err(CommissionError::RuleOutOfRange);
            }
        }

        let mut contract = self
            .repo
            .get_contract(reference)
            .await?
            .ok_or_else(|| CommissionError::ContractNotFound(reference.to_string()))?;

        contract.commission_rule = rule;
        let ledger = self.repo.ledger_for_contract(reference).await?;
        contract.figures = derive_for_contract(&contract, &ledger);
        self.repo.save_contract(&contract).await?;

        Ok(contract.figures)
    }

    /// Change the contract-level uplift, bounded by config, and recompute.
    pub async fn set_uplift(
        &self,
        reference: &str,
        uplift_p_per_kwh: Decimal,
        pricing: &PricingConfig,
    ) -> Result<CommissionFigures, CommissionError> {
        check_uplift(uplift_p_per_kwh, pricing)?;

        let mut contract = self
            .repo
            .get_contract(reference)
            .await?
            .ok_or_else(|| CommissionError::ContractNotFound(reference.to_string()))?;

        contract.uplift_p_per_kwh = uplift_p_per_kwh;
        let ledger = self.repo.ledger_for_contract(reference).await?;
        contract.figures = derive_for_contract(&contract, &ledger);
        self.repo.save_contract(&contract).await?;

        Ok(contract.figures)
    }

    /// Append a reconciliation line and recompute the running balances.
    ///
    /// Returns whether the line was new alongside the fresh figures;
    /// re-appending an identical line changes nothing.
    pub async fn append_line(
        &self,
        line: &ReconciliationLine,
    ) -> Result<(bool, CommissionFigures), CommissionError> {
        // The contract must exist before its ledger grows.
        if self
            .repo
            .get_contract(&line.contract_reference)
            .await?
            .is_none()
        {
            return Err(CommissionError::ContractNotFound(
                line.contract_reference.clone(),
            ));
        }

        let inserted = self.repo.append_reconciliation_line(line).await?;
        let figures = self.recompute(&line.contract_reference).await?;
        Ok((inserted, figures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo::test_support::setup_test_repo;
    use crate::domain::{Contract, ContractType, LedgerSide};
    use tempfile::TempDir;

    async fn setup() -> (CommissionService, Arc<Repository>, TempDir) {
        let (repo, temp) = setup_test_repo().await;
        let repo = Arc::new(repo);
        (CommissionService::new(repo.clone()), repo, temp)
    }

    fn rule() -> CommissionRule {
        CommissionRule::new("Acme 3yr", "Acme Energy", 3)
            .with_supplier_percent(Decimal::from_i64(50))
            .with_broker_split_percent(Decimal::from_i64(80))
            .with_upfront_percent(Decimal::from_i64(25))
    }

    async fn seed_contract(repo: &Repository) {
        let mut c = Contract::new(
            "CT-0001",
            "Holt & Sons",
            "Acme Energy",
            ContractType::Electricity,
        );
        c.total_usage_kwh = Decimal::from_i64(50000);
        c.uplift_p_per_kwh = Decimal::from_i64(2);
        repo.insert_contract(&c).await.unwrap();
    }

    #[tokio::test]
    async fn recompute_persists_the_whole_snapshot() {
        let (service, repo, _temp) = setup().await;
        seed_contract(&repo).await;

        let figures = service.recompute("CT-0001").await.unwrap();
        assert_eq!(figures.supplier_commission, Decimal::from_i64(1000));

        let saved = repo.get_contract("CT-0001").await.unwrap().unwrap();
        assert_eq!(saved.figures, figures);
    }

    #[tokio::test]
    async fn setting_a_rule_invalidates_old_figures() {
        let (service, repo, _temp) = setup().await;
        seed_contract(&repo).await;

        service.recompute("CT-0001").await.unwrap();
        let figures = service.set_rule("CT-0001", Some(rule())).await.unwrap();

        assert_eq!(figures.supplier_commission, Decimal::from_i64(500));
        assert_eq!(figures.full_commission, Decimal::from_i64(400));
        assert_eq!(figures.commission_first_payment, Decimal::from_i64(100));

        let saved = repo.get_contract("CT-0001").await.unwrap().unwrap();
        assert_eq!(saved.figures, figures);
    }

    #[tokio::test]
    async fn out_of_range_rule_is_rejected_before_persisting() {
        let (service, repo, _temp) = setup().await;
        seed_contract(&repo).await;

        let bad = rule().with_supplier_percent(Decimal::from_i64(150));
        let result = service.set_rule("CT-0001", Some(bad)).await;
        assert!(matches!(result, Err(CommissionError::RuleOutOfRange)));

        let saved = repo.get_contract("CT-0001").await.unwrap().unwrap();
        assert_eq!(saved.commission_rule, None);
    }

    #[tokio::test]
    async fn clearing_the_rule_restores_pass_through() {
        let (service, repo, _temp) = setup().await;
        seed_contract(&repo).await;
        service.set_rule("CT-0001", Some(rule())).await.unwrap();

        let figures = service.set_rule("CT-0001", None).await.unwrap();
        assert_eq!(figures.supplier_commission, Decimal::from_i64(1000));
        assert_eq!(figures.full_commission, Decimal::from_i64(1000));
    }

    #[tokio::test]
    async fn uplift_change_is_bounded_and_recomputes() {
        let (service, repo, _temp) = setup().await;
        seed_contract(&repo).await;

        let pricing = PricingConfig {
            max_uplift_p_per_kwh: Some(Decimal::from_i64(3)),
            default_uplift_p_per_kwh: None,
        };

        let figures = service
            .set_uplift("CT-0001", Decimal::from_i64(3), &pricing)
            .await
            .unwrap();
        assert_eq!(figures.supplier_commission, Decimal::from_i64(1500));

        let result = service
            .set_uplift("CT-0001", Decimal::from_i64(4), &pricing)
            .await;
        assert!(matches!(result, Err(CommissionError::Uplift(_))));
    }

    #[tokio::test]
    async fn appended_lines_flow_into_balances() {
        let (service, repo, _temp) = setup().await;
        seed_contract(&repo).await;
        service.set_rule("CT-0001", Some(rule())).await.unwrap();

        let line = ReconciliationLine::new(
            "CT-0001",
            LedgerSide::Broker,
            "2026-02-01".parse().unwrap(),
            Decimal::from_i64(450),
            None,
        );
        let (inserted, figures) = service.append_line(&line).await.unwrap();
        assert!(inserted);
        // 500 - 100 - 450
        assert_eq!(figures.commission_to_pay, Decimal::from_i64(-50));

        let (inserted_again, figures_again) = service.append_line(&line).await.unwrap();
        assert!(!inserted_again);
        assert_eq!(figures_again, figures);
    }

    #[tokio::test]
    async fn append_to_unknown_contract_fails() {
        let (service, _repo, _temp) = setup().await;
        let line = ReconciliationLine::new(
            "CT-9999",
            LedgerSide::Supplier,
            "2026-02-01".parse().unwrap(),
            Decimal::from_i64(10),
            None,
        );
        assert!(matches!(
            service.append_line(&line).await,
            Err(CommissionError::ContractNotFound(_))
        ));
    }
}
