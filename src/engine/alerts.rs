//! Time-driven expiry alerts and renewal reminders.
//!
//! Run by a periodic external trigger; every operation here is
//! idempotent for a given `today`.

use crate::domain::Contract;
use chrono::NaiveDate;

/// Renewal alert windows, in days before contract end.
pub const ALERT_THRESHOLD_DAYS: [i64; 3] = [90, 60, 30];

/// Update a contract's expiry alert for `today`.
///
/// The alert fires when days-until-end first reaches a threshold, and
/// once per threshold: a sweep that misses the exact day still fires on
/// the next run. `alert_no` records the tightest threshold crossed so
/// far. A contract whose end date moves back out beyond every window is
/// cleared. Contracts with no end date, or already past it, are left
/// untouched.
///
/// Returns true when any field changed.
pub fn sweep_alert(contract: &mut Contract, today: NaiveDate) -> bool {
    let Some(end_date) = contract.end_date else {
        return false;
    };
    let days = (end_date - today).num_days();
    if days < 0 {
        return false;
    }

    let crossed = ALERT_THRESHOLD_DAYS
        .iter()
        .copied()
        .filter(|t| days <= *t)
        .min();

    match crossed {
        Some(threshold) => {
            let marker = threshold.to_string();
            if contract.alert && contract.alert_no.as_deref() == Some(&marker) {
                return false;
            }
            contract.alert = true;
            contract.alert_no = Some(marker);
            true
        }
        None => {
            if !contract.alert && contract.alert_no.is_none() {
                return false;
            }
            contract.alert = false;
            contract.alert_no = None;
            true
        }
    }
}

/// A renewal reminder due today for one contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub contract_reference: String,
    /// Days until the contract ends: 90, 60 or 30.
    pub days_until_end: i64,
}

/// Days-until-end when `end_date` is exactly today + 90/60/30 days.
///
/// Reminders are scheduled for a specific day; a sweep on any other day
/// produces none for this contract.
pub fn reminder_due(end_date: NaiveDate, today: NaiveDate) -> Option<i64> {
    let days = (end_date - today).num_days();
    ALERT_THRESHOLD_DAYS.contains(&days).then_some(days)
}

/// Collect the reminders due today across a set of contracts.
pub fn sweep_reminders<'a, I>(contracts: I, today: NaiveDate) -> Vec<Reminder>
where
    I: IntoIterator<Item = &'a Contract>,
{
    contracts
        .into_iter()
        .filter_map(|c| {
            let end_date = c.end_date?;
            reminder_due(end_date, today).map(|days| Reminder {
                contract_reference: c.reference.clone(),
                days_until_end: days,
            })
        })
        .collect()
}
