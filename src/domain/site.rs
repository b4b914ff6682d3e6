//! Customer supply sites: the physical locations whose meters get
//! tendered.

use crate::domain::meter::{self, MeterIdentifier, MeterValidationError};
use crate::domain::quote::{MeterType, RequestLine};
use crate::domain::Decimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A customer site with one metered supply.
///
/// The identifier is validated at entry, through the same function every
/// other entry point uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub customer: String,
    pub meter_type: MeterType,
    pub identifier: MeterIdentifier,
    pub annual_usage_kwh: Decimal,
    /// Supply capacity, half-hourly sites only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kva: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supply_address: Option<String>,
}

impl Site {
    /// Register a site, validating its meter identifier.
    pub fn new(
        name: impl Into<String>,
        customer: impl Into<String>,
        raw_identifier: &str,
        meter_type: MeterType,
        annual_usage_kwh: Decimal,
    ) -> Result<Self, MeterValidationError> {
        let identifier = meter::validate(raw_identifier, meter_type.kind())?;
        Ok(Site {
            name: name.into(),
            customer: customer.into(),
            meter_type,
            identifier,
            annual_usage_kwh,
            kva: None,
            current_supplier: None,
            contract_end_date: None,
            supply_address: None,
        })
    }

    pub fn with_supply_address(mut self, address: impl Into<String>) -> Self {
        self.supply_address = Some(address.into());
        self
    }

    pub fn with_current_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.current_supplier = Some(supplier.into());
        self
    }

    pub fn with_contract_end_date(mut self, date: NaiveDate) -> Self {
        self.contract_end_date = Some(date);
        self
    }

    pub fn with_kva(mut self, kva: Decimal) -> Self {
        self.kva = Some(kva);
        self
    }
}

impl RequestLine {
    /// Prefill a request line from a registered site.
    pub fn from_site(site: &Site) -> RequestLine {
        RequestLine {
            identifier: site.identifier.clone(),
            meter_type: site.meter_type,
            annual_usage_kwh: site.annual_usage_kwh,
            current_supplier: site.current_supplier.clone(),
            contract_end_date: site.contract_end_date,
            supply_address: site.supply_address.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MeterKind;

    #[test]
    fn site_entry_validates_the_identifier() {
        let site = Site::new(
            "Mill Lane Works",
            "Holt & Sons",
            "12 0002 3305 963",
            MeterType::Hh,
            Decimal::from_i64(120000),
        )
        .unwrap();
        assert_eq!(site.identifier.as_str(), "1200023305963");
        assert_eq!(site.identifier.kind(), MeterKind::Electricity);

        assert!(Site::new(
            "Mill Lane Works",
            "Holt & Sons",
            "1200023305967",
            MeterType::Hh,
            Decimal::from_i64(120000),
        )
        .is_err());
    }

    #[test]
    fn request_line_prefills_from_site() {
        let site = Site::new(
            "Mill Lane Works",
            "Holt & Sons",
            "1200023305963",
            MeterType::Hh,
            Decimal::from_i64(120000),
        )
        .unwrap()
        .with_current_supplier("Old Power Co")
        .with_contract_end_date("2026-12-31".parse().unwrap())
        .with_supply_address("1 Mill Lane, Leeds")
        .with_kva(Decimal::from_i64(150));

        let line = RequestLine::from_site(&site);
        assert_eq!(line.identifier, site.identifier);
        assert_eq!(line.meter_type, MeterType::Hh);
        assert_eq!(line.annual_usage_kwh, Decimal::from_i64(120000));
        assert_eq!(line.current_supplier.as_deref(), Some("Old Power Co"));
        assert_eq!(line.supply_address.as_deref(), Some("1 Mill Lane, Leeds"));
    }
}
