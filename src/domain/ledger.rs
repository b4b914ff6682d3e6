//! Append-only commission reconciliation ledger entries.

use crate::domain::Decimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which party a reconciliation amount concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerSide {
    /// Commission actually received from the supplier.
    Supplier,
    /// Commission actually paid out to the broker.
    Broker,
}

impl LedgerSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerSide::Supplier => "supplier",
            LedgerSide::Broker => "broker",
        }
    }
}

impl std::fmt::Display for LedgerSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One actual commission amount received or paid.
///
/// Never mutated after creation; true-ups are recorded as further lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationLine {
    /// Stable unique identifier, derived from the line's own fields.
    pub event_key: String,
    pub contract_reference: String,
    pub side: LedgerSide,
    pub date: NaiveDate,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ReconciliationLine {
    /// Create a line and compute its `event_key`.
    pub fn new(
        contract_reference: impl Into<String>,
        side: LedgerSide,
        date: NaiveDate,
        amount: Decimal,
        note: Option<String>,
    ) -> Self {
        let contract_reference = contract_reference.into();
        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let event_key =
            Self::compute_event_key(&contract_reference, side, date, &amount, note.as_deref());
        ReconciliationLine {
            event_key,
            contract_reference,
            side,
            date,
            amount,
            note,
        }
    }

    /// Compute a stable unique key over the line's deterministic fields.
    ///
    /// A SHA-256 hash truncated to 128 bits; re-appending an identical
    /// line produces the same key, so the store can ignore the duplicate.
    pub fn compute_event_key(
        contract_reference: &str,
        side: LedgerSide,
        date: NaiveDate,
        amount: &Decimal,
        note: Option<&str>,
    ) -> String {
        use sha2::{Digest, Sha256};

        fn hash_var(hasher: &mut Sha256, data: &str) {
            hasher.update((data.len() as u32).to_le_bytes());
            hasher.update(data.as_bytes());
        }

        let mut hasher = Sha256::new();
        hash_var(&mut hasher, contract_reference);
        hash_var(&mut hasher, side.as_str());
        hash_var(&mut hasher, &date.to_string());
        hash_var(&mut hasher, &amount.to_canonical_string());
        hash_var(&mut hasher, note.unwrap_or(""));

        let hash = hasher.finalize();
        format!("recon:{}", hex::encode(&hash[..16]))
    }
}

/// The reconciliation lines attached to one contract.
///
/// An explicit zero-or-more relationship: consumers branch on
/// [`ReconciliationLedger::has_supplier_lines`], never on a failed read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationLedger {
    lines: Vec<ReconciliationLine>,
}

impl ReconciliationLedger {
    pub fn new() -> Self {
        ReconciliationLedger { lines: Vec::new() }
    }

    pub fn from_lines(lines: Vec<ReconciliationLine>) -> Self {
        ReconciliationLedger { lines }
    }

    /// Append a line. Lines are never removed or edited.
    pub fn append(&mut self, line: ReconciliationLine) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[ReconciliationLine] {
        &self.lines
    }

    pub fn has_supplier_lines(&self) -> bool {
        self.lines
            .iter()
            .any(|l| l.side == LedgerSide::Supplier)
    }

    /// Sum of amounts on one side of the ledger.
    pub fn sum_side(&self, side: LedgerSide) -> Decimal {
        self.lines
            .iter()
            .filter(|l| l.side == side)
            .map(|l| l.amount)
            .sum()
    }
}
