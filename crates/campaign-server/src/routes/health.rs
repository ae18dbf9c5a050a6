use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// `GET /health` — liveness check.
///
/// Returns `200 OK` when the persistence gateway answers a ping within the
/// gateway timeout, `503 Service Unavailable` otherwise.
///
/// Response shape:
/// ```json
/// { "status": "ok", "version": "0.1.0" }
/// ```
#[tracing::instrument(skip(state))]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let ping = tokio::time::timeout(state.config.gateway_timeout(), state.gateway.ping()).await;
    match ping {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION")
            })),
        )
            .into_response(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Health check: gateway unreachable");
            degraded()
        }
        Err(_) => {
            tracing::error!("Health check: gateway ping timed out");
            degraded()
        }
    }
}

fn degraded() -> axum::response::Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "status": "degraded",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
        .into_response()
}
