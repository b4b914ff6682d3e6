//! Shape adapter for pricing API responses.
//!
//! The API's response schema is not fixed; the offer list is discovered
//! from an explicit, ordered set of accepted shapes, and each offer item
//! is probed for known key spellings. Flexibility stops here: what comes
//! out is the crate's own strict types.

use crate::domain::{meter, Decimal, RequestLine, TariffQuote};
use serde_json::Value;
use tracing::{debug, warn};

/// A quote offer recovered from a pricing API response item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    /// Whitespace-normalized meter identifier.
    pub identifier: String,
    pub unit_rate_p_per_kwh: Decimal,
    pub standing_charge_gbp_per_day: Decimal,
    pub term_years: i64,
    pub kva_price: Option<Decimal>,
}

impl Offer {
    pub fn to_quote(&self) -> TariffQuote {
        let mut quote = TariffQuote::new(self.unit_rate_p_per_kwh, self.standing_charge_gbp_per_day)
            .with_term_years(self.term_years);
        if let Some(kva) = self.kva_price {
            quote = quote.with_kva_price(kva);
        }
        quote
    }
}

/// Accepted offer-list keys, probed in order; first match wins.
const OFFER_LIST_KEYS: [&str; 3] = ["offers", "quotes", "results"];

/// Find the offer list in a response payload.
///
/// A top-level array is itself the list; otherwise the first of
/// `offers`/`quotes`/`results` holding an array wins. Anything else
/// yields an empty list.
pub fn extract_offers(payload: &Value) -> &[Value] {
    if let Some(items) = payload.as_array() {
        return items;
    }
    if let Some(object) = payload.as_object() {
        for key in OFFER_LIST_KEYS {
            if let Some(items) = object.get(key).and_then(Value::as_array) {
                return items;
            }
        }
    }
    &[]
}

/// Parse one offer item.
///
/// Returns None when the identifier or a required numeric field is
/// missing or malformed; the caller skips the item and keeps going.
pub fn parse_offer(item: &Value) -> Option<Offer> {
    let identifier = string_field(item, &["identifier", "mpan", "mprn"])
        .map(|s| meter::normalize(&s))
        .filter(|s| !s.is_empty())?;

    let unit_rate_p_per_kwh =
        decimal_field(item, &["unit_rate_p_per_kwh", "unit_rate_ppkwh", "unit_rate"])?;
    let standing_charge_gbp_per_day = decimal_field(
        item,
        &["standing_charge_gbp_per_day", "standing_charge_per_day", "standing"],
    )?;

    let term_years = item
        .get("term_years")
        .and_then(Value::as_i64)
        .or_else(|| item.get("term_months").and_then(Value::as_i64).map(|m| m / 12))
        .filter(|y| *y > 0)
        .unwrap_or(1);

    let kva_price = decimal_field(item, &["kva_price"]);

    Some(Offer {
        identifier,
        unit_rate_p_per_kwh,
        standing_charge_gbp_per_day,
        term_years,
        kva_price,
    })
}

/// An offer matched back to the request line it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedOffer {
    pub line_index: usize,
    pub offer: Offer,
}

/// Map a response payload onto request lines by normalized identifier.
///
/// Malformed items and offers for unknown identifiers are dropped
/// individually; a payload with no usable offers maps to an empty list,
/// not an error.
pub fn map_offers(payload: &Value, lines: &[RequestLine]) -> Vec<MatchedOffer> {
    let items = extract_offers(payload);

    let mut matched = Vec::new();
    for item in items {
        let Some(offer) = parse_offer(item) else {
            warn!("Skipping malformed offer item: {}", item);
            continue;
        };
        let Some(line_index) = lines
            .iter()
            .position(|l| l.identifier.as_str() == offer.identifier)
        else {
            debug!("Skipping offer for unknown identifier {}", offer.identifier);
            continue;
        };
        matched.push(MatchedOffer { line_index, offer });
    }
    matched
}

fn string_field(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| item.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

/// Read a decimal from the first present key, accepting either a JSON
/// number or a numeric string.
fn decimal_field(item: &Value, keys: &[&str]) -> Option<Decimal> {
    let value = keys.iter().find_map(|k| item.get(*k))?;
    match value {
        Value::Number(n) => Decimal::from_str_canonical(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str_canonical(s.trim()).ok(),
        _ => None,
    }
}
