//! UK meter identifier validation: electricity MPANs and gas MPRNs.
//!
//! Every place a raw identifier enters the system (site entry, price
//! request lines, contract creation) goes through [`validate`] so the
//! rules cannot drift between entry points.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which supply a meter identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeterKind {
    /// Electricity supply, identified by a 13-digit MPAN core.
    Electricity,
    /// Gas supply, identified by a 6-11 digit MPRN.
    Gas,
}

impl std::fmt::Display for MeterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeterKind::Electricity => write!(f, "electricity"),
            MeterKind::Gas => write!(f, "gas"),
        }
    }
}

/// A validated, whitespace-normalized meter identifier.
///
/// Immutable once constructed; re-validate by calling [`validate`] again
/// if the raw string or kind changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeterIdentifier {
    digits: String,
    kind: MeterKind,
}

impl MeterIdentifier {
    /// The normalized digit string.
    pub fn as_str(&self) -> &str {
        &self.digits
    }

    pub fn kind(&self) -> MeterKind {
        self.kind
    }
}

impl std::fmt::Display for MeterIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digits)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeterValidationError {
    /// Wrong length, non-digit characters, or a failed check digit.
    #[error("invalid MPAN")]
    InvalidMpan,
    /// Not a 6-11 digit string.
    #[error("invalid MPRN")]
    InvalidMprn,
}

/// MPAN check-digit weights, cycled over the first 12 digits.
const MPAN_WEIGHTS: [u32; 3] = [3, 7, 1];

/// Validate and normalize a raw meter identifier.
///
/// Whitespace is stripped before any length or digit check. Electricity
/// identifiers must be exactly 13 digits whose 13th digit equals the
/// weighted sum of the first 12 (weights 3,7,1 repeating) mod 10. Gas
/// identifiers must be 6 to 11 digits; there is no check digit.
pub fn validate(raw: &str, kind: MeterKind) -> Result<MeterIdentifier, MeterValidationError> {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    match kind {
        MeterKind::Electricity => {
            if digits.len() != 13 || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(MeterValidationError::InvalidMpan);
            }
            if mpan_check_digit(&digits[..12]) != digits.as_bytes()[12] - b'0' {
                return Err(MeterValidationError::InvalidMpan);
            }
        }
        MeterKind::Gas => {
            if !(6..=11).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(MeterValidationError::InvalidMprn);
            }
        }
    }

    Ok(MeterIdentifier { digits, kind })
}

/// Weighted-sum check digit over a 12-digit MPAN core.
///
/// Caller guarantees `core` is exactly 12 ASCII digits.
fn mpan_check_digit(core: &str) -> u8 {
    let total: u32 = core
        .bytes()
        .enumerate()
        .map(|(i, b)| (b - b'0') as u32 * MPAN_WEIGHTS[i % 3])
        .sum();
    (total % 10) as u8
}

/// Strip whitespace from a raw identifier without validating it.
///
/// Used when matching externally supplied offers back to request lines,
/// where both sides must normalize identically.
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}
