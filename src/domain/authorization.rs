//! Letters of Authority: the customer's permission to tender on their
//! behalf.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// LOA workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationStatus {
    Draft,
    Sent,
    Signed,
    Valid,
    Expired,
}

impl AuthorizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationStatus::Draft => "draft",
            AuthorizationStatus::Sent => "sent",
            AuthorizationStatus::Signed => "signed",
            AuthorizationStatus::Valid => "valid",
            AuthorizationStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<AuthorizationStatus> {
        match s {
            "draft" => Some(AuthorizationStatus::Draft),
            "sent" => Some(AuthorizationStatus::Sent),
            "signed" => Some(AuthorizationStatus::Signed),
            "valid" => Some(AuthorizationStatus::Valid),
            "expired" => Some(AuthorizationStatus::Expired),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("cannot validate an expired letter of authority")]
    Expired,
    #[error("letter of authority must be valid and not expired before sending a price request")]
    NotUsable,
}

/// A customer's Letter of Authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub reference: String,
    pub customer: String,
    pub status: AuthorizationStatus,
    pub issue_date: NaiveDate,
    /// Twelve months after issue.
    pub expiry_date: NaiveDate,
}

impl Authorization {
    pub fn new(
        reference: impl Into<String>,
        customer: impl Into<String>,
        issue_date: NaiveDate,
    ) -> Self {
        Authorization {
            reference: reference.into(),
            customer: customer.into(),
            status: AuthorizationStatus::Draft,
            issue_date,
            expiry_date: expiry_for(issue_date),
        }
    }

    pub fn display_name(&self) -> String {
        crate::domain::display_name(&self.reference, Some(&self.customer))
    }

    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }

    /// Mark the LOA valid.
    ///
    /// # Errors
    /// Fails when the LOA has passed its expiry date.
    pub fn validate(&mut self, today: NaiveDate) -> Result<(), AuthorizationError> {
        if self.is_expired_on(today) {
            return Err(AuthorizationError::Expired);
        }
        self.status = AuthorizationStatus::Valid;
        Ok(())
    }

    /// Check the LOA can back a price request today.
    ///
    /// # Errors
    /// Fails unless the status is `Valid` and the expiry date has not
    /// passed.
    pub fn ensure_usable(&self, today: NaiveDate) -> Result<(), AuthorizationError> {
        if self.status != AuthorizationStatus::Valid || self.is_expired_on(today) {
            return Err(AuthorizationError::NotUsable);
        }
        Ok(())
    }

    /// Move a past-expiry LOA to `Expired`. Returns true when the
    /// status changed; re-running on the same day changes nothing.
    pub fn sweep_expiry(&mut self, today: NaiveDate) -> bool {
        if self.is_expired_on(today) && self.status != AuthorizationStatus::Expired {
            self.status = AuthorizationStatus::Expired;
            return true;
        }
        false
    }
}

/// Expiry is twelve months after issue, clamped to a real calendar day.
fn expiry_for(issue_date: NaiveDate) -> NaiveDate {
    issue_date
        .checked_add_months(Months::new(12))
        .unwrap_or(issue_date)
}
