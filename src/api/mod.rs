pub mod authorizations;
pub mod contracts;
pub mod health;
pub mod meters;
pub mod quotes;
pub mod sweeps;

use crate::config::Config;
use crate::datasource::{PricingApi, SignatureProvider};
use crate::db::Repository;
use crate::orchestration::{CommissionService, QuoteCollector, SignatureService, SweepService};
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub quotes: Arc<QuoteCollector>,
    pub signature: Arc<SignatureService>,
    pub commission: Arc<CommissionService>,
    pub sweeps: Arc<SweepService>,
}

impl AppState {
    pub fn new(
        repo: Arc<Repository>,
        config: Config,
        pricing: Arc<dyn PricingApi>,
        sign_provider: Arc<dyn SignatureProvider>,
    ) -> Self {
        let quotes = Arc::new(QuoteCollector::new(pricing, config.pricing_config()));
        let signature = Arc::new(SignatureService::new(sign_provider, repo.clone()));
        let commission = Arc::new(CommissionService::new(repo.clone()));
        let sweeps = Arc::new(SweepService::new(repo.clone()));
        Self {
            repo,
            config,
            quotes,
            signature,
            commission,
            sweeps,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/meters/validate", post(meters::validate_meter))
        .route("/v1/quotes/price", post(quotes::price_quote))
        .route("/v1/quotes/collect", post(quotes::collect_quotes))
        .route("/v1/quotes/tender", post(quotes::tender))
        .route("/v1/quotes/comparison", post(quotes::finalize_comparison))
        .route(
            "/v1/authorizations",
            post(authorizations::create_authorization),
        )
        .route(
            "/v1/authorizations/:reference/validate",
            post(authorizations::validate_authorization),
        )
        .route("/v1/contracts", post(contracts::create_contract))
        .route("/v1/contracts/:reference", get(contracts::get_contract))
        .route(
            "/v1/contracts/:reference/status",
            put(contracts::set_status),
        )
        .route("/v1/contracts/:reference/rule", put(contracts::set_rule))
        .route(
            "/v1/contracts/:reference/uplift",
            put(contracts::set_uplift),
        )
        .route(
            "/v1/contracts/:reference/reconciliation",
            post(contracts::append_reconciliation),
        )
        .route(
            "/v1/contracts/:reference/send-for-signature",
            post(contracts::send_for_signature),
        )
        .route(
            "/v1/contracts/:reference/sync-signature",
            post(contracts::sync_signature),
        )
        .route(
            "/v1/contracts/sync-signatures",
            post(contracts::sync_all_signatures),
        )
        .route("/v1/sweeps/expiry", post(sweeps::run_expiry_sweep))
        .layer(cors)
        .with_state(state)
}
