//! Pure computation engines: pricing, commission derivation, lifecycle
//! reconciliation and time sweeps.

pub mod alerts;
pub mod commission;
pub mod lifecycle;
pub mod pricer;

pub use alerts::{sweep_alert, sweep_reminders, Reminder, ALERT_THRESHOLD_DAYS};
pub use commission::{derive, derive_for_contract, CommissionInputs};
pub use lifecycle::{
    apply_observation, prepare_signature_request, ProviderSignStatus, SignatureObservation,
    SignatureRequestSpec,
};
pub use pricer::{
    annual_cost, check_uplift, price, price_line, price_with_uplift, PricingConfig, PricingError,
    UpliftedPrice,
};
