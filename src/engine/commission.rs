//! Commission derivation: a pure, ordered chain from usage and uplift
//! down to the running commission-to-pay balance.

use crate::domain::{
    CommissionFigures, CommissionRule, Contract, Decimal, LedgerSide, ReconciliationLedger,
};

/// Inputs to one commission derivation.
#[derive(Debug, Clone, Copy)]
pub struct CommissionInputs<'a> {
    /// Sum of annual usage across the winning response's lines; zero
    /// when no response is attached.
    pub total_usage_kwh: Decimal,
    /// Contract-level uplift, distinct from any per-line uplift.
    pub uplift_p_per_kwh: Decimal,
    pub rule: Option<&'a CommissionRule>,
    pub ledger: &'a ReconciliationLedger,
}

/// Run the full derivation chain. Later fields read earlier ones; the
/// whole snapshot is produced together.
///
/// Fallbacks are part of the contract, not error paths: an absent rule
/// (or a zero percentage) leaves the broker capturing the full uplift
/// value, and an empty supplier ledger means the full commission is
/// still expected.
pub fn derive(inputs: CommissionInputs<'_>) -> CommissionFigures {
    let base = inputs.total_usage_kwh * inputs.uplift_p_per_kwh / Decimal::hundred();

    let supplier_commission = match inputs.rule {
        Some(rule) if !rule.supplier_percent.is_zero() => rule.supplier_percent.percent_of(base),
        _ => base,
    };

    let full_commission = match inputs.rule {
        Some(rule) if !rule.broker_split_percent.is_zero() => {
            rule.broker_split_percent.percent_of(supplier_commission)
        }
        _ => supplier_commission,
    };

    // Zero upfront is a real agreed value; only an unset upfront (or no
    // rule at all) leaves the first payment at zero by default.
    let commission_first_payment = match inputs.rule.and_then(|r| r.upfront_percent) {
        Some(upfront) => upfront.percent_of(full_commission),
        None => Decimal::zero(),
    };

    let commission_amount_total = if inputs.ledger.has_supplier_lines() {
        inputs.ledger.sum_side(LedgerSide::Supplier)
    } else {
        full_commission
    };

    let broker_paid = inputs.ledger.sum_side(LedgerSide::Broker);
    // May go negative when the broker has been overpaid; surfaced as-is.
    let commission_to_pay = supplier_commission - commission_first_payment - broker_paid;

    CommissionFigures {
        supplier_commission,
        full_commission,
        commission_first_payment,
        commission_amount_total,
        commission_to_pay,
    }
}

/// Derive figures from a contract's own inputs plus its ledger.
pub fn derive_for_contract(
    contract: &Contract,
    ledger: &ReconciliationLedger,
) -> CommissionFigures {
    derive(CommissionInputs {
        total_usage_kwh: contract.total_usage_kwh,
        uplift_p_per_kwh: contract.uplift_p_per_kwh,
        rule: contract.commission_rule.as_ref(),
        ledger,
    })
}
