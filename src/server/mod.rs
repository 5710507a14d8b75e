//! HTTP surface — axum routes over the pipeline and store.

pub mod rate_limit;
mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::pipeline::AnalysisPipeline;
use crate::server::rate_limit::RateLimits;
use crate::store::Database;

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub db: Arc<dyn Database>,
    pub limits: Arc<RateLimits>,
    /// Model identifier, reported by the health endpoint.
    pub model: String,
}

/// Build the API router.
///
/// `allowed_origin` restricts CORS to one origin; anything unparseable
/// falls back to allowing any origin.
pub fn build_router(state: AppState, allowed_origin: Option<&str>) -> Router {
    let cors = match allowed_origin.and_then(|o| o.parse::<axum::http::HeaderValue>().ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    routes::api_routes(state).layer(cors)
}
