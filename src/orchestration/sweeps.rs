//! Periodic time-driven sweeps: authorization expiry, contract expiry
//! alerts and renewal reminders.
//!
//! Driven by an external scheduler; re-running a sweep for the same day
//! never changes state beyond a single run.

use crate::db::Repository;
use crate::engine::{sweep_alert, sweep_reminders, Reminder};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

/// Outcome of one expiry sweep run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub authorizations_expired: usize,
    pub alerts_updated: usize,
    pub reminders: Vec<Reminder>,
}

pub struct SweepService {
    repo: Arc<Repository>,
}

impl SweepService {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Run every time-driven check for `today`.
    pub async fn run(&self, today: NaiveDate) -> Result<SweepReport, sqlx::Error> {
        let authorizations_expired = self.expire_authorizations(today).await?;

        let mut alerts_updated = 0;
        let contracts = self.repo.list_contracts_with_end_dates().await?;
        for mut contract in contracts.clone() {
            if sweep_alert(&mut contract, today) {
                self.repo.save_contract(&contract).await?;
                alerts_updated += 1;
            }
        }

        let reminders = sweep_reminders(contracts.iter(), today);

        info!(
            %today,
            authorizations_expired,
            alerts_updated,
            reminders = reminders.len(),
            "Expiry sweep complete"
        );
        Ok(SweepReport {
            authorizations_expired,
            alerts_updated,
            reminders,
        })
    }

    async fn expire_authorizations(&self, today: NaiveDate) -> Result<usize, sqlx::Error> {
        let mut expired = 0;
        for mut loa in self.repo.list_authorizations().await? {
            if loa.sweep_expiry(today) {
                self.repo.upsert_authorization(&loa).await?;
                expired += 1;
            }
        }
        Ok(expired)
    }
}
