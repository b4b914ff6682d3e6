//! Price requests, supplier tariff quotes and priced response lines.

use crate::domain::meter::{self, MeterIdentifier, MeterKind, MeterValidationError};
use crate::domain::Decimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// UK metering arrangement for a supply point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeterType {
    /// Half-hourly electricity.
    Hh,
    /// Non-half-hourly electricity.
    Nhh,
    /// Gas.
    Gas,
}

impl MeterType {
    /// The identifier family this metering arrangement uses.
    pub fn kind(&self) -> MeterKind {
        match self {
            MeterType::Hh | MeterType::Nhh => MeterKind::Electricity,
            MeterType::Gas => MeterKind::Gas,
        }
    }
}

impl std::fmt::Display for MeterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeterType::Hh => write!(f, "hh"),
            MeterType::Nhh => write!(f, "nhh"),
            MeterType::Gas => write!(f, "gas"),
        }
    }
}

/// One meter on a price request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLine {
    pub identifier: MeterIdentifier,
    pub meter_type: MeterType,
    pub annual_usage_kwh: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supply_address: Option<String>,
}

impl RequestLine {
    /// Build a line from a raw identifier, validating it for the meter type.
    pub fn new(
        raw_identifier: &str,
        meter_type: MeterType,
        annual_usage_kwh: Decimal,
    ) -> Result<Self, MeterValidationError> {
        let identifier = meter::validate(raw_identifier, meter_type.kind())?;
        Ok(RequestLine {
            identifier,
            meter_type,
            annual_usage_kwh,
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
}

/// A tender: the set of meters a customer wants priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRequest {
    pub reference: String,
    pub customer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    pub lines: Vec<RequestLine>,
}

impl PriceRequest {
    pub fn new(reference: impl Into<String>, customer: impl Into<String>) -> Self {
        PriceRequest {
            reference: reference.into(),
            customer: customer.into(),
            customer_email: None,
            lines: Vec::new(),
        }
    }

    pub fn with_customer_email(mut self, email: impl Into<String>) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    pub fn with_line(mut self, line: RequestLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn display_name(&self) -> String {
        crate::domain::display_name(&self.reference, Some(&self.customer))
    }
}

/// A supplier's quoted tariff for one meter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffQuote {
    /// Unit rate in pence per kWh.
    pub unit_rate_p_per_kwh: Decimal,
    /// Standing charge in pounds per day.
    pub standing_charge_gbp_per_day: Decimal,
    pub contract_term_years: i64,
    /// Capacity charge per kVA, quoted for half-hourly supplies only.
    /// Carried for comparison; not part of the annual-cost formula.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kva_price: Option<Decimal>,
}

impl TariffQuote {
    pub fn new(unit_rate_p_per_kwh: Decimal, standing_charge_gbp_per_day: Decimal) -> Self {
        TariffQuote {
            unit_rate_p_per_kwh,
            standing_charge_gbp_per_day,
            contract_term_years: 1,
            kva_price: None,
        }
    }

    pub fn with_term_years(mut self, years: i64) -> Self {
        self.contract_term_years = years;
        self
    }

    pub fn with_kva_price(mut self, price: Decimal) -> Self {
        self.kva_price = Some(price);
        self
    }
}

/// A quote priced against a request line's usage.
///
/// Derived figures are recomputed by the pricer whenever any input
/// changes; they are stored here, never edited directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseLine {
    /// Identifier of the request line this quote answers.
    pub identifier: MeterIdentifier,
    pub quote: TariffQuote,
    pub annual_usage_kwh: Decimal,
    pub annual_cost: Decimal,
    /// Broker markup in pence per kWh. Manager-only; bounded by config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uplift_p_per_kwh: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_rate_with_uplift_p_per_kwh: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_cost_with_uplift: Option<Decimal>,
}

/// One supplier's answer to a price request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceResponse {
    pub supplier: String,
    pub lines: Vec<ResponseLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_best_offer: bool,
}

impl PriceResponse {
    pub fn new(supplier: impl Into<String>) -> Self {
        PriceResponse {
            supplier: supplier.into(),
            lines: Vec::new(),
            notes: None,
            is_best_offer: false,
        }
    }

    /// Sum of annual costs across all priced lines.
    pub fn total_annual_cost(&self) -> Decimal {
        self.lines.iter().map(|l| l.annual_cost).sum()
    }

    /// Sum of linked annual usage across lines; feeds the commission base.
    pub fn total_usage_kwh(&self) -> Decimal {
        self.lines.iter().map(|l| l.annual_usage_kwh).sum()
    }
}
