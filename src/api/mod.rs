use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::cache::BriefingService;
use crate::generator::TextGenerator;
use crate::search::SearchService;

pub mod handlers;
pub mod models;

/// Topics offered to users who don't bring their own.
pub const DEFAULT_TOPICS: &[&str] = &[
    "Artificial Intelligence",
    "Blockchain & Cryptocurrency",
    "Quantum Computing",
    "Space Exploration",
    "Biotechnology",
    "Cybersecurity",
    "Renewable Energy",
];

pub fn create_router<S, G>(service: Arc<BriefingService<S, G>>) -> Router
where
    S: SearchService + 'static,
    G: TextGenerator + 'static,
{
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/briefing", post(handlers::briefing_handler::<S, G>))
        .route(
            "/api/briefing/download",
            get(handlers::download_handler::<S, G>),
        )
        .route("/api/topics", get(handlers::topics_handler))
        .with_state(service)
        .layer(cors)
}
