use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lead_enrichment_api::api::{handlers::AppState, routes};
use lead_enrichment_api::config::Config;
use lead_enrichment_api::core::enrichment::LeadEnricher;
use lead_enrichment_api::integrations::{lead_store::InMemoryLeadStore, sources::build_http_client};
use lead_enrichment_api::prospecting::SyntheticLeadGenerator;

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, builds the shared HTTP client
/// and enrichment pipeline, then serves the API with body-size and per-IP
/// rate limits.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_enrichment_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // One client for every live adapter
    let client = build_http_client(config.source_timeout())?;
    tracing::info!("HTTP client initialized ({}s timeout)", config.source_timeout_secs);

    let enricher = Arc::new(LeadEnricher::from_config(&config, &client));
    tracing::info!(
        "Enrichment pipeline ready: {} mode, {} scoring, batches of {}",
        config.source_mode.as_str(),
        config.scoring_strategy.as_str(),
        config.batch_size
    );

    let app_state = Arc::new(AppState {
        config: config.clone(),
        store: Arc::new(InMemoryLeadStore::new()),
        enricher,
        generator: Arc::new(SyntheticLeadGenerator::new()),
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let api = routes::api_routes().layer(ServiceBuilder::new().layer(GovernorLayer {
        config: governor_conf,
    }));
    let app = routes::build_router(app_state, api);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
