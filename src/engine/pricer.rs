//! Tariff pricing: annual cost derivation and the uplift path.

use crate::domain::{Decimal, MeterIdentifier, ResponseLine, TariffQuote};
use thiserror::Error;

/// Pricing configuration, passed in explicitly at call time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PricingConfig {
    /// Hard ceiling on any broker uplift, in pence per kWh.
    /// None disables the check.
    pub max_uplift_p_per_kwh: Option<Decimal>,
    /// Uplift applied to collected quotes when none is given per line.
    pub default_uplift_p_per_kwh: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("uplift exceeds maximum allowed ({max} p/kWh)")]
    UpliftExceedsMax { max: Decimal },
}

/// Billing days per year used by the standing-charge term.
const DAYS_PER_YEAR: i64 = 365;

/// Annual cost in whole currency units:
/// `unit_rate/100 × usage + standing_charge × 365`.
///
/// Inputs are taken as-is; negative or out-of-range usage propagates
/// arithmetically. Pure and deterministic: identical inputs always
/// produce the identical result.
pub fn annual_cost(
    unit_rate_p_per_kwh: Decimal,
    standing_charge_gbp_per_day: Decimal,
    annual_usage_kwh: Decimal,
) -> Decimal {
    let energy = unit_rate_p_per_kwh / Decimal::hundred() * annual_usage_kwh;
    let standing = standing_charge_gbp_per_day * Decimal::from_i64(DAYS_PER_YEAR);
    energy + standing
}

/// Annual cost for a quote against a line's usage.
pub fn price(quote: &TariffQuote, annual_usage_kwh: Decimal) -> Decimal {
    annual_cost(
        quote.unit_rate_p_per_kwh,
        quote.standing_charge_gbp_per_day,
        annual_usage_kwh,
    )
}

/// An uplifted unit rate plus the resulting annual cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpliftedPrice {
    pub unit_rate_with_uplift_p_per_kwh: Decimal,
    pub annual_cost: Decimal,
}

/// Add the uplift to the unit rate, then apply the same cost formula.
/// The uplifted rate is returned alongside the cost for display.
pub fn price_with_uplift(
    quote: &TariffQuote,
    uplift_p_per_kwh: Decimal,
    annual_usage_kwh: Decimal,
) -> UpliftedPrice {
    let unit_rate_with_uplift_p_per_kwh = quote.unit_rate_p_per_kwh + uplift_p_per_kwh;
    UpliftedPrice {
        unit_rate_with_uplift_p_per_kwh,
        annual_cost: annual_cost(
            unit_rate_with_uplift_p_per_kwh,
            quote.standing_charge_gbp_per_day,
            annual_usage_kwh,
        ),
    }
}

/// Reject uplifts above the configured maximum.
///
/// # Errors
/// Returns [`PricingError::UpliftExceedsMax`] when a maximum is set and
/// the uplift exceeds it.
pub fn check_uplift(uplift_p_per_kwh: Decimal, config: &PricingConfig) -> Result<(), PricingError> {
    if let Some(max) = config.max_uplift_p_per_kwh {
        if uplift_p_per_kwh > max {
            return Err(PricingError::UpliftExceedsMax { max });
        }
    }
    Ok(())
}

/// Build a fully priced response line, applying and bounding the uplift
/// when one is given.
///
/// # Errors
/// Returns an error when the uplift exceeds the configured maximum; the
/// line is not built.
pub fn price_line(
    identifier: MeterIdentifier,
    quote: TariffQuote,
    annual_usage_kwh: Decimal,
    uplift_p_per_kwh: Option<Decimal>,
    config: &PricingConfig,
) -> Result<ResponseLine, PricingError> {
    let base_cost = price(&quote, annual_usage_kwh);

    let mut line = ResponseLine {
        identifier,
        quote,
        annual_usage_kwh,
        annual_cost: base_cost,
        uplift_p_per_kwh: None,
        unit_rate_with_uplift_p_per_kwh: None,
        annual_cost_with_uplift: None,
    };

    if let Some(uplift) = uplift_p_per_kwh {
        check_uplift(uplift, config)?;
        let uplifted = price_with_uplift(&line.quote, uplift, annual_usage_kwh);
        line.uplift_p_per_kwh = Some(uplift);
        line.unit_rate_with_uplift_p_per_kwh = Some(uplifted.unit_rate_with_uplift_p_per_kwh);
        line.annual_cost_with_uplift = Some(uplifted.annual_cost);
    }

    Ok(line)
}
