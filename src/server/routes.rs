// src/server/routes.rs
//! Axum router configuration for the rezept server

use crate::server::ServerState;
use crate::server::handlers::{recipes, render};
use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main application router
///
/// `cors_origins` lists the origins allowed to call the API from a browser;
/// with none, only same-origin requests work.
pub fn create_router(state: Arc<RwLock<ServerState>>, cors_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST]);

    // PDFs are already compressed
    let pdf_routes = Router::new()
        .route("/v1/recipes/:id/pdf", get(recipes::get_recipe_pdf))
        .with_state(state.clone());

    let compressed_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/recipes/:id", get(recipes::get_recipe))
        .route("/v1/render", post(render::render_text))
        .layer(CompressionLayer::new())
        .with_state(state);

    Router::new()
        .merge(pdf_routes)
        .merge(compressed_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
