//! Letter of Authority persistence.

use super::Repository;
use crate::domain::{Authorization, AuthorizationStatus};
use sqlx::Row;
use tracing::warn;

impl Repository {
    /// Insert or replace an authorization record.
    pub async fn upsert_authorization(&self, loa: &Authorization) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO authorizations (reference, customer, status, issue_date, expiry_date)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(reference) DO UPDATE SET
                customer = excluded.customer,
                status = excluded.status,
                issue_date = excluded.issue_date,
                expiry_date = excluded.expiry_date
            "#,
        )
        .bind(&loa.reference)
        .bind(&loa.customer)
        .bind(loa.status.as_str())
        .bind(loa.issue_date.to_string())
        .bind(loa.expiry_date.to_string())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Fetch an authorization by reference.
    pub async fn get_authorization(
        &self,
        reference: &str,
    ) -> Result<Option<Authorization>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT reference, customer, status, issue_date, expiry_date FROM authorizations WHERE reference = ?",
        )
        .bind(reference)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.and_then(|r| row_to_authorization(&r)))
    }

    /// All authorization records, for the expiry sweep.
    pub async fn list_authorizations(&self) -> Result<Vec<Authorization>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT reference, customer, status, issue_date, expiry_date FROM authorizations ORDER BY reference ASC",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().filter_map(row_to_authorization).collect())
    }
}

fn row_to_authorization(row: &sqlx::sqlite::SqliteRow) -> Option<Authorization> {
    let reference: String = row.get("reference");
    let status_str: String = row.get("status");
    let issue_str: String = row.get("issue_date");
    let expiry_str: String = row.get("expiry_date");

    let status = AuthorizationStatus::parse(&status_str);
    let issue_date = issue_str.parse().ok();
    let expiry_date = expiry_str.parse().ok();

    match (status, issue_date, expiry_date) {
        (Some(status), Some(issue_date), Some(expiry_date)) => Some(Authorization {
            reference,
            customer: row.get("customer"),
            status,
            issue_date,
            expiry_date,
        }),
        _ => {
            warn!(reference = %reference, "Skipping unreadable authorization row");
            None
        }
    }
}
