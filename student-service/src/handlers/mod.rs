//! HTTP handlers for student-service.

pub mod docs;
pub mod students;
pub mod summary;

use crate::services::get_metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Health check endpoint for Docker/K8s liveness checks.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "student-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness check endpoint for K8s readiness checks.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let students = state.store.len().await;
    (
        StatusCode::OK,
        Json(json!({ "status": "ready", "students": students })),
    )
}

/// Prometheus metrics endpoint.
pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
