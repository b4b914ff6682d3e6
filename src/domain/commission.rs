//! Commission rules and the derived commission snapshot.

use crate::domain::Decimal;
use serde::{Deserialize, Serialize};

/// How commission is split for a supplier over a contract duration.
///
/// Percentages are stored as plain decimals in [0,100]; the rule itself
/// enforces no range. Out-of-range values are a configuration error the
/// API boundary rejects before a rule is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRule {
    pub name: String,
    pub supplier: String,
    pub year_duration: i64,
    /// Share of the uplift-derived base paid by the supplier.
    /// Zero means the rule is silent and the full base applies.
    pub supplier_percent: Decimal,
    /// Broker's share of the supplier commission.
    /// Zero means the rule is silent and the full amount passes through.
    pub broker_split_percent: Decimal,
    /// Share of the broker total paid immediately. `None` means no
    /// upfront term was agreed; `Some(0)` is an agreed zero upfront
    /// payment. The two are distinct to callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upfront_percent: Option<Decimal>,
}

impl CommissionRule {
    pub fn new(name: impl Into<String>, supplier: impl Into<String>, year_duration: i64) -> Self {
        CommissionRule {
            name: name.into(),
            supplier: supplier.into(),
            year_duration,
            supplier_percent: Decimal::zero(),
            broker_split_percent: Decimal::zero(),
            upfront_percent: None,
        }
    }

    pub fn with_supplier_percent(mut self, percent: Decimal) -> Self {
        self.supplier_percent = percent;
        self
    }

    pub fn with_broker_split_percent(mut self, percent: Decimal) -> Self {
        self.broker_split_percent = percent;
        self
    }

    pub fn with_upfront_percent(mut self, percent: Decimal) -> Self {
        self.upfront_percent = Some(percent);
        self
    }

    /// True when every percentage sits in [0,100].
    ///
    /// Callers treat a rule failing this as a configuration error; the
    /// derivation chain itself never checks.
    pub fn percentages_in_range(&self) -> bool {
        let in_range = |p: Decimal| !p.is_negative() && p <= Decimal::hundred();
        in_range(self.supplier_percent)
            && in_range(self.broker_split_percent)
            && self.upfront_percent.map_or(true, in_range)
    }
}

/// The full set of derived commission figures for a contract.
///
/// Always produced and committed together; no partially updated snapshot
/// is ever observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommissionFigures {
    /// Commission owed by the supplier on the uplift-derived base.
    pub supplier_commission: Decimal,
    /// Broker's share after the split.
    pub full_commission: Decimal,
    /// Upfront portion contractually due immediately.
    pub commission_first_payment: Decimal,
    /// Actual supplier-paid total, falling back to `full_commission`
    /// until reconciliation data exists.
    pub commission_amount_total: Decimal,
    /// Remaining balance owed to the broker. Negative when the broker
    /// has been overpaid relative to the current supplier commission.
    pub commission_to_pay: Decimal,
}
