//! Repository layer for database operations.
//!
//! Methods are organized across submodules by domain:
//! - `authorizations.rs` - Letter of Authority records
//! - `contracts.rs` - Contract records with their commission snapshot
//! - `ledger.rs` - Append-only reconciliation lines

mod authorizations;
mod contracts;
mod ledger;

use crate::domain::Decimal;
use sqlx::sqlite::SqlitePool;
use std::str::FromStr;
use tracing::warn;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Parse a stored canonical decimal, defaulting to zero on corruption.
///
/// Decimals are stored as their canonical strings; SQLite REAL columns
/// would round-trip through floats and lose precision.
pub(crate) fn parse_decimal(column: &str, raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap_or_else(|e| {
        warn!(
            column = column,
            value = raw,
            error = %e,
            "Failed to parse stored decimal, using zero"
        );
        Decimal::default()
    })
}

/// Parse an optional stored decimal column.
pub(crate) fn parse_decimal_opt(column: &str, raw: Option<String>) -> Option<Decimal> {
    raw.map(|s| parse_decimal(column, &s))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_decimal_defaults_to_zero() {
        assert_eq!(parse_decimal("amount", "not-a-number"), Decimal::zero());
        assert_eq!(parse_decimal("amount", "12.5").to_canonical_string(), "12.5");
    }

    #[test]
    fn optional_decimal_passes_none_through() {
        assert_eq!(parse_decimal_opt("x", None), None);
        assert_eq!(
            parse_decimal_opt("x", Some("3".to_string())),
            Some(Decimal::from_i64(3))
        );
    }
}
