//! Domain types for the brokerage engine.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Validated meter identifiers (MPAN/MPRN)
//! - Price requests, tariff quotes and priced response lines
//! - Commission rules and derived commission figures
//! - Append-only reconciliation ledger entries
//! - Contract and authorization records with closed status enums

pub mod authorization;
pub mod commission;
pub mod contract;
pub mod decimal;
pub mod ledger;
pub mod meter;
pub mod quote;
pub mod site;

pub use authorization::{Authorization, AuthorizationError, AuthorizationStatus};
pub use commission::{CommissionFigures, CommissionRule};
pub use contract::{Contract, ContractStatus, ContractType, SignStatus, SignatureWorkflow};
pub use decimal::Decimal;
pub use ledger::{LedgerSide, ReconciliationLedger, ReconciliationLine};
pub use meter::{MeterIdentifier, MeterKind, MeterValidationError};
pub use quote::{MeterType, PriceRequest, PriceResponse, RequestLine, ResponseLine, TariffQuote};
pub use site::Site;

/// Human-facing record label: reference plus counterparty when known.
pub fn display_name(reference: &str, customer: Option<&str>) -> String {
    match customer.filter(|c| !c.is_empty()) {
        Some(customer) => format!("{} - {}", reference, customer),
        None => reference.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_with_and_without_customer() {
        assert_eq!(display_name("CT-0001", Some("Holt & Sons")), "CT-0001 - Holt & Sons");
        assert_eq!(display_name("CT-0001", None), "CT-0001");
        assert_eq!(display_name("CT-0001", Some("")), "CT-0001");
    }
}
