//! Contract persistence.
//!
//! A contract's derived commission figures, lifecycle status and
//! signature workflow are always written together in a single statement;
//! no partially updated contract row is ever observable.

use super::{parse_decimal, parse_decimal_opt, Repository};
use crate::domain::{
    CommissionFigures, CommissionRule, Contract, ContractStatus, ContractType, SignStatus,
    SignatureWorkflow,
};
use chrono::DateTime;
use sqlx::Row;
use tracing::warn;

impl Repository {
    /// Insert a new contract.
    ///
    /// # Errors
    /// Returns an error if a contract with the same reference exists.
    pub async fn insert_contract(&self, contract: &Contract) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO contracts (
                reference, customer, supplier, contract_type, status,
                unit_rate_p_per_kwh, standing_charge_gbp_per_day,
                start_date, end_date, price_response_ref, total_usage_kwh,
                uplift_p_per_kwh,
                rule_name, rule_supplier, rule_year_duration,
                rule_supplier_percent, rule_broker_split_percent, rule_upfront_percent,
                supplier_commission, full_commission, commission_first_payment,
                commission_amount_total, commission_to_pay,
                sign_status, sign_request_ref, sign_template, sign_signer,
                sign_completed_on, executed_document, alert, alert_no
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&contract.reference)
        .bind(&contract.customer)
        .bind(&contract.supplier)
        .bind(contract.contract_type.as_str())
        .bind(contract.status.as_str())
        .bind(contract.unit_rate_p_per_kwh.to_canonical_string())
        .bind(contract.standing_charge_gbp_per_day.to_canonical_string())
        .bind(contract.start_date.map(|d| d.to_string()))
        .bind(contract.end_date.map(|d| d.to_string()))
        .bind(contract.price_response_ref.as_deref())
        .bind(contract.total_usage_kwh.to_canonical_string())
        .bind(contract.uplift_p_per_kwh.to_canonical_string())
        .bind(contract.commission_rule.as_ref().map(|r| r.name.as_str()))
        .bind(contract.commission_rule.as_ref().map(|r| r.supplier.as_str()))
        .bind(contract.commission_rule.as_ref().map(|r| r.year_duration))
        .bind(
            contract
                .commission_rule
                .as_ref()
                .map(|r| r.supplier_percent.to_canonical_string()),
        )
        .bind(
            contract
                .commission_rule
                .as_ref()
                .map(|r| r.broker_split_percent.to_canonical_string()),
        )
        .bind(
            contract
                .commission_rule
                .as_ref()
                .and_then(|r| r.upfront_percent)
                .map(|p| p.to_canonical_string()),
        )
        .bind(contract.figures.supplier_commission.to_canonical_string())
        .bind(contract.figures.full_commission.to_canonical_string())
        .bind(
            contract
                .figures
                .commission_first_payment
                .to_canonical_string(),
        )
        .bind(
            contract
                .figures
                .commission_amount_total
                .to_canonical_string(),
        )
        .bind(contract.figures.commission_to_pay.to_canonical_string())
        .bind(contract.sign.status.map(|s| s.as_str()))
        .bind(contract.sign.request_ref.as_deref())
        .bind(contract.sign.template.as_deref())
        .bind(contract.sign.signer.as_deref())
        .bind(contract.sign.completed_on.map(|t| t.to_rfc3339()))
        .bind(contract.sign.executed_document.as_deref())
        .bind(contract.alert as i64)
        .bind(contract.alert_no.as_deref())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Rewrite every mutable column of a contract in one statement.
    ///
    /// Returns false when no row with the contract's reference exists.
    pub async fn save_contract(&self, contract: &Contract) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE contracts SET
                customer = ?, supplier = ?, contract_type = ?, status = ?,
                unit_rate_p_per_kwh = ?, standing_charge_gbp_per_day = ?,
                start_date = ?, end_date = ?, price_response_ref = ?,
                total_usage_kwh = ?, uplift_p_per_kwh = ?,
                rule_name = ?, rule_supplier = ?, rule_year_duration = ?,
                rule_supplier_percent = ?, rule_broker_split_percent = ?,
                rule_upfront_percent = ?,
                supplier_commission = ?, full_commission = ?,
                commission_first_payment = ?, commission_amount_total = ?,
                commission_to_pay = ?,
                sign_status = ?, sign_request_ref = ?, sign_template = ?,
                sign_signer = ?, sign_completed_on = ?, executed_document = ?,
                alert = ?, alert_no = ?
            WHERE reference = ?
            "#,
        )
        .bind(&contract.customer)
        .bind(&contract.supplier)
        .bind(contract.contract_type.as_str())
        .bind(contract.status.as_str())
        .bind(contract.unit_rate_p_per_kwh.to_canonical_string())
        .bind(contract.standing_charge_gbp_per_day.to_canonical_string())
        .bind(contract.start_date.map(|d| d.to_string()))
        .bind(contract.end_date.map(|d| d.to_string()))
        .bind(contract.price_response_ref.as_deref())
        .bind(contract.total_usage_kwh.to_canonical_string())
        .bind(contract.uplift_p_per_kwh.to_canonical_string())
        .bind(contract.commission_rule.as_ref().map(|r| r.name.as_str()))
        .bind(contract.commission_rule.as_ref().map(|r| r.supplier.as_str()))
        .bind(contract.commission_rule.as_ref().map(|r| r.year_duration))
        .bind(
            contract
                .commission_rule
                .as_ref()
                .map(|r| r.supplier_percent.to_canonical_string()),
        )
        .bind(
            contract
                .commission_rule
                .as_ref()
                .map(|r| r.broker_split_percent.to_canonical_string()),
        )
        .bind(
            contract
                .commission_rule
                .as_ref()
                .and_then(|r| r.upfront_percent)
                .map(|p| p.to_canonical_string()),
        )
        .bind(contract.figures.supplier_commission.to_canonical_string())
        .bind(contract.figures.full_commission.to_canonical_string())
        .bind(
            contract
                .figures
                .commission_first_payment
                .to_canonical_string(),
        )
        .bind(
            contract
                .figures
                .commission_amount_total
                .to_canonical_string(),
        )
        .bind(contract.figures.commission_to_pay.to_canonical_string())
        .bind(contract.sign.status.map(|s| s.as_str()))
        .bind(contract.sign.request_ref.as_deref())
        .bind(contract.sign.template.as_deref())
        .bind(contract.sign.signer.as_deref())
        .bind(contract.sign.completed_on.map(|t| t.to_rfc3339()))
        .bind(contract.sign.executed_document.as_deref())
        .bind(contract.alert as i64)
        .bind(contract.alert_no.as_deref())
        .bind(&contract.reference)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch a contract by reference.
    pub async fn get_contract(&self, reference: &str) -> Result<Option<Contract>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM contracts WHERE reference = ?")
            .bind(reference)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.and_then(|r| row_to_contract(&r)))
    }

    /// All contracts, ordered by reference.
    pub async fn list_contracts(&self) -> Result<Vec<Contract>, sqlx::Error> {
        let rows = sqlx::query("SELECT * FROM contracts ORDER BY reference ASC")
            .fetch_all(self.pool())
            .await?;

        Ok(rows.iter().filter_map(row_to_contract).collect())
    }

    /// Contracts with an open signature request, for the sync sweep.
    pub async fn list_contracts_with_sign_requests(&self) -> Result<Vec<Contract>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT * FROM contracts WHERE sign_request_ref IS NOT NULL ORDER BY reference ASC",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().filter_map(row_to_contract).collect())
    }

    /// Contracts with an end date, for the expiry sweeps.
    pub async fn list_contracts_with_end_dates(&self) -> Result<Vec<Contract>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT * FROM contracts WHERE end_date IS NOT NULL ORDER BY reference ASC",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().filter_map(row_to_contract).collect())
    }
}

fn row_to_contract(row: &sqlx::sqlite::SqliteRow) -> Option<Contract> {
    let reference: String = row.get("reference");

    let contract_type_str: String = row.get("contract_type");
    let contract_type = match contract_type_str.as_str() {
        "electricity" => ContractType::Electricity,
        "gas" => ContractType::Gas,
        "dual" => ContractType::Dual,
        other => {
            warn!(reference = %reference, contract_type = other, "Skipping contract with unknown type");
            return None;
        }
    };

    let status_str: String = row.get("status");
    let Some(status) = ContractStatus::parse(&status_str) else {
        warn!(reference = %reference, status = %status_str, "Skipping contract with unknown status");
        return None;
    };

    let rule_name: Option<String> = row.get("rule_name");
    let commission_rule = rule_name.map(|name| CommissionRule {
        name,
        supplier: row.get::<Option<String>, _>("rule_supplier").unwrap_or_default(),
        year_duration: row.get::<Option<i64>, _>("rule_year_duration").unwrap_or(1),
        supplier_percent: parse_decimal_opt("rule_supplier_percent", row.get("rule_supplier_percent"))
            .unwrap_or_default(),
        broker_split_percent: parse_decimal_opt(
            "rule_broker_split_percent",
            row.get("rule_broker_split_percent"),
        )
        .unwrap_or_default(),
        upfront_percent: parse_decimal_opt("rule_upfront_percent", row.get("rule_upfront_percent")),
    });

    let figures = CommissionFigures {
        supplier_commission: parse_decimal(
            "supplier_commission",
            &row.get::<String, _>("supplier_commission"),
        ),
        full_commission: parse_decimal("full_commission", &row.get::<String, _>("full_commission")),
        commission_first_payment: parse_decimal(
            "commission_first_payment",
            &row.get::<String, _>("commission_first_payment"),
        ),
        commission_amount_total: parse_decimal(
            "commission_amount_total",
            &row.get::<String, _>("commission_amount_total"),
        ),
        commission_to_pay: parse_decimal(
            "commission_to_pay",
            &row.get::<String, _>("commission_to_pay"),
        ),
    };

    let sign = SignatureWorkflow {
        status: row
            .get::<Option<String>, _>("sign_status")
            .as_deref()
            .and_then(SignStatus::parse),
        request_ref: row.get("sign_request_ref"),
        template: row.get("sign_template"),
        signer: row.get("sign_signer"),
        completed_on: row
            .get::<Option<String>, _>("sign_completed_on")
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.to_utc()),
        executed_document: row.get("executed_document"),
    };

    Some(Contract {
        reference,
        customer: row.get("customer"),
        supplier: row.get("supplier"),
        contract_type,
        status,
        unit_rate_p_per_kwh: parse_decimal(
            "unit_rate_p_per_kwh",
            &row.get::<String, _>("unit_rate_p_per_kwh"),
        ),
        standing_charge_gbp_per_day: parse_decimal(
            "standing_charge_gbp_per_day",
            &row.get::<String, _>("standing_charge_gbp_per_day"),
        ),
        start_date: row
            .get::<Option<String>, _>("start_date")
            .and_then(|s| s.parse().ok()),
        end_date: row
            .get::<Option<String>, _>("end_date")
            .and_then(|s| s.parse().ok()),
        price_response_ref: row.get("price_response_ref"),
        total_usage_kwh: parse_decimal("total_usage_kwh", &row.get::<String, _>("total_usage_kwh")),
        uplift_p_per_kwh: parse_decimal(
            "uplift_p_per_kwh",
            &row.get::<String, _>("uplift_p_per_kwh"),
        ),
        commission_rule,
        figures,
        sign,
        alert: row.get::<i64, _>("alert") != 0,
        alert_no: row.get("alert_no"),
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::setup_test_repo;
    use crate::domain::{CommissionRule, Contract, ContractStatus, ContractType, Decimal, SignStatus};
    use chrono::{TimeZone, Utc};

    fn contract() -> Contract {
        let mut c = Contract::new(
            "CT-0001",
            "Holt & Sons",
            "Acme Energy",
            ContractType::Electricity,
        );
        c.unit_rate_p_per_kwh = Decimal::from_str_canonical("10.5").unwrap();
        c.standing_charge_gbp_per_day = Decimal::from_str_canonical("0.45").unwrap();
        c.start_date = Some("2026-10-01".parse().unwrap());
        c.end_date = Some("2029-10-01".parse().unwrap());
        c.total_usage_kwh = Decimal::from_i64(50000);
        c.uplift_p_per_kwh = Decimal::from_i64(2);
        c.commission_rule = Some(
            CommissionRule::new("Acme 3yr", "Acme Energy", 3)
                .with_supplier_percent(Decimal::from_i64(50))
                .with_broker_split_percent(Decimal::from_i64(80))
                .with_upfront_percent(Decimal::from_i64(25)),
        );
        c
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let (repo, _temp) = setup_test_repo().await;

        let original = contract();
        repo.insert_contract(&original).await.unwrap();

        let loaded = repo.get_contract("CT-0001").await.unwrap().unwrap();
        assert_eq!(loaded, original);

        assert!(repo.get_contract("CT-9999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_reference_is_an_error() {
        let (repo, _temp) = setup_test_repo().await;
        repo.insert_contract(&contract()).await.unwrap();
        assert!(repo.insert_contract(&contract()).await.is_err());
    }

    #[tokio::test]
    async fn save_rewrites_all_mutable_fields() {
        let (repo, _temp) = setup_test_repo().await;

        let mut c = contract();
        repo.insert_contract(&c).await.unwrap();

        c.status = ContractStatus::Confirmed;
        c.sign.status = Some(SignStatus::Signed);
        c.sign.request_ref = Some("sig-1".to_string());
        c.sign.completed_on = Some(Utc.timestamp_opt(1_760_000_000, 0).unwrap());
        c.sign.executed_document = Some("doc-3.pdf".to_string());
        c.figures.supplier_commission = Decimal::from_i64(500);
        c.figures.commission_to_pay = Decimal::from_i64(-50);
        c.alert = true;
        c.alert_no = Some("60".to_string());

        assert!(repo.save_contract(&c).await.unwrap());
        let loaded = repo.get_contract("CT-0001").await.unwrap().unwrap();
        assert_eq!(loaded, c);
    }

    #[tokio::test]
    async fn save_of_unknown_reference_reports_false() {
        let (repo, _temp) = setup_test_repo().await;
        assert!(!repo.save_contract(&contract()).await.unwrap());
    }

    #[tokio::test]
    async fn rule_with_unset_upfront_round_trips_as_none() {
        let (repo, _temp) = setup_test_repo().await;

        let mut c = contract();
        c.commission_rule = Some(
            CommissionRule::new("no upfront", "Acme Energy", 1)
                .with_supplier_percent(Decimal::from_i64(50)),
        );
        repo.insert_contract(&c).await.unwrap();

        let loaded = repo.get_contract("CT-0001").await.unwrap().unwrap();
        assert_eq!(loaded.commission_rule.unwrap().upfront_percent, None);
    }

    #[tokio::test]
    async fn sweep_listings_filter_correctly() {
        let (repo, _temp) = setup_test_repo().await;

        let mut with_sign = contract();
        with_sign.sign.request_ref = Some("sig-1".to_string());
        repo.insert_contract(&with_sign).await.unwrap();

        let mut open_ended = contract();
        open_ended.reference = "CT-0002".to_string();
        open_ended.end_date = None;
        repo.insert_contract(&open_ended).await.unwrap();

        let signing = repo.list_contracts_with_sign_requests().await.unwrap();
        assert_eq!(signing.len(), 1);
        assert_eq!(signing[0].reference, "CT-0001");

        let ending = repo.list_contracts_with_end_dates().await.unwrap();
        assert_eq!(ending.len(), 1);
        assert_eq!(ending[0].reference, "CT-0001");

        assert_eq!(repo.list_contracts().await.unwrap().len(), 2);
    }
}
