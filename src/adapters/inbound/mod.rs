pub mod http;
pub mod ws;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::application::CoordinationService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CoordinationService>,
    pub demo_default_count: usize,
}

impl AppState {
    pub fn new(service: Arc<CoordinationService>, demo_default_count: usize) -> Self {
        Self {
            service,
            demo_default_count,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws/agent", get(ws::agent_ws_handler))
        .route("/optimise", post(http::optimise_handler))
        .route("/demo", get(http::demo_handler))
        .route("/health", get(http::health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
