use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use campaign_core::{
    metrics::{parse_date_event, MetricRow},
    shaping::shape,
};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub client_code: Option<String>,
    pub date_event: Option<String>,
}

async fn resolve_rows(state: &AppState, query: &MetricsQuery) -> Result<Vec<MetricRow>, AppError> {
    let date_event = match query.date_event.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_date_event(raw).ok_or_else(|| {
            AppError::BadRequest("date_event must be a YYYY-MM-DD date".to_string())
        })?),
    };

    let rows = state
        .metrics
        .fetch_metrics(query.client_code.as_deref(), date_event)
        .await?;
    Ok(rows)
}

/// `GET /api/metrics` (alias `/api/v1/campaign-metrics`) — raw metric rows
/// for one client.
///
/// Response shape:
/// ```json
/// { "success": true, "data": [ { "client_code": "ECOM1", "metric_name": "...", ... } ] }
/// ```
#[tracing::instrument(skip(state))]
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
    query: Result<Query<MetricsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    let rows = resolve_rows(&state, &query).await?;
    Ok(Json(json!({
        "success": true,
        "data": rows,
    })))
}

/// `GET /api/metrics/shaped` — the same rows projected into cards, a time
/// series and a categorical series.
#[tracing::instrument(skip(state))]
pub async fn get_shaped_metrics(
    State(state): State<Arc<AppState>>,
    query: Result<Query<MetricsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    let rows = resolve_rows(&state, &query).await?;
    Ok(Json(json!({
        "success": true,
        "data": shape(&rows),
    })))
}
