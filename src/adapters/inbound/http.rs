use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::application::{HealthReport, OptimiseSummary};

#[derive(Debug, Deserialize)]
pub struct DemoParams {
    pub num_cars: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DemoResponse {
    pub agents: Vec<String>,
}

/// `POST /optimise`
pub async fn optimise_handler(State(state): State<AppState>) -> Json<OptimiseSummary> {
    Json(state.service.optimise().await)
}

/// `GET /demo?num_cars=N`
pub async fn demo_handler(
    State(state): State<AppState>,
    Query(params): Query<DemoParams>,
) -> Result<Json<DemoResponse>, (StatusCode, String)> {
    let count = params.num_cars.unwrap_or(state.demo_default_count);
    let agents = state
        .service
        .spawn_demo(count)
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(DemoResponse { agents }))
}

/// `GET /health`
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.service.health().await)
}
