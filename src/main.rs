use std::net::SocketAddr;
use std::sync::Arc;
use wattbroker::datasource::{HttpPricingApi, HttpSignatureProvider};
use wattbroker::{api, config::Config, db::init_db, PricingApi, Repository, SignatureProvider};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Initialize database and dependencies
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let pricing: Arc<dyn PricingApi> = Arc::new(HttpPricingApi::new(
        config.pricing_api_url.clone(),
        config.pricing_api_key.clone(),
        config.http_timeout(),
    ));
    let sign_provider: Arc<dyn SignatureProvider> = Arc::new(HttpSignatureProvider::new(
        config.sign_api_url.clone(),
        config.sign_api_key.clone(),
        config.http_timeout(),
    ));

    // Create router
    let app = api::create_router(api::AppState::new(repo, config, pricing, sign_provider));

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
