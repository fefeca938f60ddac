//! HTTP surface: landing page, static assets, start-process endpoint.

pub mod error;
pub mod handlers;

use std::path::Path;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::trigger::ProcessTrigger;

pub use error::{AppError, PROCESS_START_FAILED};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub trigger: ProcessTrigger,
}

impl AppState {
    pub fn new(trigger: ProcessTrigger) -> Self {
        Self { trigger }
    }
}

/// Build the router. Anything not matched by an API route is looked up in
/// `public_dir`.
pub fn build_router(state: AppState, public_dir: &Path) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(public_dir.join("index.html")))
        .route("/start-process", post(handlers::start_process))
        .route("/health", get(handlers::health))
        .fallback_service(ServeDir::new(public_dir))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}
