//! Customer contracts: lifecycle status, signature workflow state and
//! the commission snapshot.

use crate::domain::{CommissionFigures, CommissionRule, Decimal};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// What supply a contract covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    Electricity,
    Gas,
    Dual,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Electricity => "electricity",
            ContractType::Gas => "gas",
            ContractType::Dual => "dual",
        }
    }
}

/// Contract lifecycle status.
///
/// The main chain runs draft through complete; the side branches are
/// reachable from any non-terminal state. `Complete`, `Cancelled` and
/// `CotCancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Draft,
    DocPending,
    SaleAgreed,
    Confirmed,
    Accepted,
    Live,
    Complete,
    PaymentConfirmed,
    Query,
    CotCancelled,
    Cancelled,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "draft",
            ContractStatus::DocPending => "doc_pending",
            ContractStatus::SaleAgreed => "sale_agreed",
            ContractStatus::Confirmed => "confirmed",
            ContractStatus::Accepted => "accepted",
            ContractStatus::Live => "live",
            ContractStatus::Complete => "complete",
            ContractStatus::PaymentConfirmed => "payment_confirmed",
            ContractStatus::Query => "query",
            ContractStatus::CotCancelled => "cot_cancelled",
            ContractStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<ContractStatus> {
        match s {
            "draft" => Some(ContractStatus::Draft),
            "doc_pending" => Some(ContractStatus::DocPending),
            "sale_agreed" => Some(ContractStatus::SaleAgreed),
            "confirmed" => Some(ContractStatus::Confirmed),
            "accepted" => Some(ContractStatus::Accepted),
            "live" => Some(ContractStatus::Live),
            "complete" => Some(ContractStatus::Complete),
            "payment_confirmed" => Some(ContractStatus::PaymentConfirmed),
            "query" => Some(ContractStatus::Query),
            "cot_cancelled" => Some(ContractStatus::CotCancelled),
            "cancelled" => Some(ContractStatus::Cancelled),
            _ => None,
        }
    }

    /// Position in the main chain, None for side branches.
    fn chain_index(&self) -> Option<u8> {
        match self {
            ContractStatus::Draft => Some(0),
            ContractStatus::DocPending => Some(1),
            ContractStatus::SaleAgreed => Some(2),
            ContractStatus::Confirmed => Some(3),
            ContractStatus::Accepted => Some(4),
            ContractStatus::Live => Some(5),
            ContractStatus::Complete => Some(6),
            _ => None,
        }
    }

    fn is_side_branch(&self) -> bool {
        matches!(
            self,
            ContractStatus::PaymentConfirmed
                | ContractStatus::Query
                | ContractStatus::CotCancelled
                | ContractStatus::Cancelled
        )
    }

    /// No transitions are defined out of a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ContractStatus::Complete | ContractStatus::Cancelled | ContractStatus::CotCancelled
        )
    }

    /// Whether an explicit move from `self` to `to` is legal.
    ///
    /// Chain states only move forward; any non-terminal state may enter
    /// a side branch; non-terminal side branches resolve back onto the
    /// chain.
    pub fn can_transition(&self, to: ContractStatus) -> bool {
        if *self == to || self.is_terminal() {
            return false;
        }
        match (self.chain_index(), to.chain_index()) {
            (Some(from_idx), Some(to_idx)) => to_idx > from_idx,
            (_, None) => to.is_side_branch(),
            (None, Some(_)) => self.is_side_branch(),
        }
    }
}

impl std::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of the external e-signature workflow, tracked independently of
/// the contract lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignStatus {
    Draft,
    Pending,
    Signed,
    Refused,
    Cancelled,
}

impl SignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignStatus::Draft => "draft",
            SignStatus::Pending => "pending",
            SignStatus::Signed => "signed",
            SignStatus::Refused => "refused",
            SignStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<SignStatus> {
        match s {
            "draft" => Some(SignStatus::Draft),
            "pending" => Some(SignStatus::Pending),
            "signed" => Some(SignStatus::Signed),
            "refused" => Some(SignStatus::Refused),
            "cancelled" => Some(SignStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for SignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State of the signing workflow attached to a contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureWorkflow {
    pub status: Option<SignStatus>,
    /// Reference of the request at the signature provider, if sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Explicit signer; the contract counterparty signs when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_on: Option<DateTime<Utc>>,
    /// Provider reference of the executed contract PDF.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_document: Option<String>,
}

impl SignatureWorkflow {
    pub fn status(&self) -> SignStatus {
        self.status.unwrap_or(SignStatus::Draft)
    }
}

/// A signed (or to-be-signed) supply contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub reference: String,
    pub customer: String,
    pub supplier: String,
    pub contract_type: ContractType,
    pub status: ContractStatus,

    pub unit_rate_p_per_kwh: Decimal,
    pub standing_charge_gbp_per_day: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    /// Identity of the winning price response, if any. The response's
    /// lines may change after contract creation; usage is re-read at
    /// recompute time, never assumed stable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_response_ref: Option<String>,
    /// Total annual usage across the winning response's lines, as of
    /// the latest recompute. Zero when no response is attached.
    pub total_usage_kwh: Decimal,

    /// Contract-level broker markup, distinct from per-line uplifts.
    pub uplift_p_per_kwh: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rule: Option<CommissionRule>,
    pub figures: CommissionFigures,

    pub sign: SignatureWorkflow,

    /// Expiry alert flag, set by the time sweep.
    pub alert: bool,
    /// Most recent alert threshold fired ("90", "60" or "30").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_no: Option<String>,
}

impl Contract {
    pub fn new(
        reference: impl Into<String>,
        customer: impl Into<String>,
        supplier: impl Into<String>,
        contract_type: ContractType,
    ) -> Self {
        Contract {
            reference: reference.into(),
            customer: customer.into(),
            supplier: supplier.into(),
            contract_type,
            status: ContractStatus::Draft,
            unit_rate_p_per_kwh: Decimal::zero(),
            standing_charge_gbp_per_day: Decimal::zero(),
            start_date: None,
            end_date: None,
            price_response_ref: None,
            total_usage_kwh: Decimal::zero(),
            uplift_p_per_kwh: Decimal::zero(),
            commission_rule: None,
            figures: CommissionFigures::default(),
            sign: SignatureWorkflow::default(),
            alert: false,
            alert_no: None,
        }
    }

    pub fn display_name(&self) -> String {
        crate::domain::display_name(&self.reference, Some(&self.customer))
    }

    /// The party who signs: the explicit signer when set, else the
    /// contract counterparty.
    pub fn effective_signer(&self) -> &str {
        self.sign.signer.as_deref().unwrap_or(&self.customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ContractStatus::*;

    #[test]
    fn chain_moves_forward_only() {
        assert!(Draft.can_transition(DocPending));
        assert!(Draft.can_transition(Confirmed));
        assert!(SaleAgreed.can_transition(Live));
        assert!(!Confirmed.can_transition(Draft));
        assert!(!Live.can_transition(Accepted));
    }

    #[test]
    fn side_branches_reachable_from_any_non_terminal_state() {
        for from in [Draft, DocPending, SaleAgreed, Confirmed, Accepted, Live, PaymentConfirmed] {
            assert!(from.can_transition(Query), "{} -> query", from);
            assert!(from.can_transition(Cancelled), "{} -> cancelled", from);
            assert!(from.can_transition(CotCancelled), "{} -> cot_cancelled", from);
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        let all = [
            Draft,
            DocPending,
            SaleAgreed,
            Confirmed,
            Accepted,
            Live,
            Complete,
            PaymentConfirmed,
            Query,
            CotCancelled,
            Cancelled,
        ];
        for terminal in [Complete, Cancelled, CotCancelled] {
            assert!(terminal.is_terminal());
            for to in all {
                assert!(!terminal.can_transition(to), "{} -> {}", terminal, to);
            }
        }
    }

    #[test]
    fn query_resolves_back_onto_the_chain() {
        assert!(Query.can_transition(Confirmed));
        assert!(Query.can_transition(Live));
        assert!(Query.can_transition(Cancelled));
    }

    #[test]
    fn same_state_is_not_a_transition() {
        assert!(!Draft.can_transition(Draft));
        assert!(!Query.can_transition(Query));
    }

    #[test]
    fn status_round_trips_through_strings() {
        let all = [
            Draft,
            DocPending,
            SaleAgreed,
            Confirmed,
            Accepted,
            Live,
            Complete,
            PaymentConfirmed,
            Query,
            CotCancelled,
            Cancelled,
        ];
        for status in all {
            assert_eq!(ContractStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ContractStatus::parse("unknown"), None);
    }

    #[test]
    fn sign_status_round_trips_through_strings() {
        for status in [
            SignStatus::Draft,
            SignStatus::Pending,
            SignStatus::Signed,
            SignStatus::Refused,
            SignStatus::Cancelled,
        ] {
            assert_eq!(SignStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn effective_signer_falls_back_to_counterparty() {
        let mut contract = Contract::new("CT-0001", "Holt & Sons", "Acme Energy", ContractType::Electricity);
        assert_eq!(contract.effective_signer(), "Holt & Sons");

        contract.sign.signer = Some("J. Holt".to_string());
        assert_eq!(contract.effective_signer(), "J. Holt");
    }
}
