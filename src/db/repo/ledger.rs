//! Append-only reconciliation ledger persistence.
//!
//! Lines are inserted idempotently by `event_key` and never updated or
//! deleted; there is deliberately no statement here that could mutate
//! an existing row.

use super::{parse_decimal, Repository};
use crate::domain::{LedgerSide, ReconciliationLedger, ReconciliationLine};
use sqlx::Row;
use tracing::warn;

impl Repository {
    /// Append a reconciliation line idempotently.
    ///
    /// Returns true when the line was new, false when an identical line
    /// (same event_key) already exists.
    pub async fn append_reconciliation_line(
        &self,
        line: &ReconciliationLine,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO reconciliation_lines (event_key, contract_reference, side, date, amount, note)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(event_key) DO NOTHING
            "#,
        )
        .bind(&line.event_key)
        .bind(&line.contract_reference)
        .bind(line.side.as_str())
        .bind(line.date.to_string())
        .bind(line.amount.to_canonical_string())
        .bind(line.note.as_deref())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Load the full ledger for a contract, oldest first.
    pub async fn ledger_for_contract(
        &self,
        contract_reference: &str,
    ) -> Result<ReconciliationLedger, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT event_key, contract_reference, side, date, amount, note
            FROM reconciliation_lines
            WHERE contract_reference = ?
            ORDER BY date ASC, id ASC
            "#,
        )
        .bind(contract_reference)
        .fetch_all(self.pool())
        .await?;

        let lines = rows
            .iter()
            .filter_map(|row| {
                let event_key: String = row.get("event_key");
                let side_str: String = row.get("side");
                let side = match side_str.as_str() {
                    "supplier" => LedgerSide::Supplier,
                    "broker" => LedgerSide::Broker,
                    other => {
                        warn!(event_key = %event_key, side = other, "Skipping ledger line with unknown side");
                        return None;
                    }
                };
                let date_str: String = row.get("date");
                let Ok(date) = date_str.parse() else {
                    warn!(event_key = %event_key, date = %date_str, "Skipping ledger line with unreadable date");
                    return None;
                };
                let amount_str: String = row.get("amount");

                Some(ReconciliationLine {
                    event_key,
                    contract_reference: row.get("contract_reference"),
                    side,
                    date,
                    amount: parse_decimal("amount", &amount_str),
                    note: row.get("note"),
                })
            })
            .collect();

        Ok(ReconciliationLedger::from_lines(lines))
    }
}
