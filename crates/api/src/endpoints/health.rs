//! Liveness endpoint.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::middleware::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
