use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::handlers::{self, AppState};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Lead and prospecting endpoints with the body size limit applied.
/// Rate limiting is layered on by the caller.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/leads", get(handlers::list_leads).post(handlers::create_lead))
        .route("/api/leads/enrich-all", post(handlers::enrich_all_leads))
        .route("/api/leads/:id", get(handlers::get_lead))
        .route("/api/leads/:id/score", get(handlers::get_lead_score))
        .route("/api/leads/:id/enrich", post(handlers::enrich_lead))
        .route("/api/prospect", post(handlers::prospect))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

/// Complete application. The health check sits outside `api` so it bypasses
/// whatever limits the caller put on it.
pub fn build_router(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
