//! One CRUD implementation shared by every entity in
//! [`campaign_core::entity::ENTITIES`].

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use campaign_core::entity::{Entity, EntitySpec, Record, EVENT_CAMPAIGN_COLUMN};

use crate::{error::AppError, state::AppState};

/// Build the routes for one entity:
///
/// - `POST /api/{table}`, `GET /api/{table}`, `GET /api/{table}/{id}`
/// - `PUT` and `DELETE /api/{table}/{id}` when the entity is mutable
pub fn entity_routes(spec: &'static EntitySpec) -> Router<Arc<AppState>> {
    let collection = format!("/api/{}", spec.table);
    let item = format!("/api/{}/{{id}}", spec.table);

    let mut item_route = get(
        move |State(state): State<Arc<AppState>>, Path(id): Path<String>| {
            fetch_one(spec, state, id)
        },
    );
    if spec.mutable {
        item_route = item_route
            .put(
                move |State(state): State<Arc<AppState>>,
                      Path(id): Path<String>,
                      body: Result<Json<Value>, JsonRejection>| {
                    update(spec, state, id, body)
                },
            )
            .delete(
                move |State(state): State<Arc<AppState>>, Path(id): Path<String>| {
                    delete(spec, state, id)
                },
            );
    }

    Router::new()
        .route(
            &collection,
            get(move |State(state): State<Arc<AppState>>| list(spec, state)).post(
                move |State(state): State<Arc<AppState>>,
                      body: Result<Json<Value>, JsonRejection>| {
                    create(spec, state, body)
                },
            ),
        )
        .route(&item, item_route)
}

/// Run a gateway call under the configured timeout, mapping failures to
/// the CRUD error contract.
async fn bounded<T>(
    state: &AppState,
    call: impl Future<Output = anyhow::Result<T>>,
) -> Result<T, AppError> {
    let timeout = state.config.gateway_timeout();
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(AppError::Gateway(format!("{e:#}"))),
        Err(_) => Err(AppError::Gateway(format!(
            "gateway request timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}

fn body_object(body: Result<Json<Value>, JsonRejection>) -> Result<Record, AppError> {
    match body? {
        Json(Value::Object(map)) => Ok(map),
        _ => Err(AppError::BadRequest(
            "request body must be a JSON object".to_string(),
        )),
    }
}

async fn create(
    spec: &'static EntitySpec,
    state: Arc<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let record = spec.writable_with_nulls(&body_object(body)?);
    bounded(&state, state.gateway.insert_record(spec.entity, record)).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": spec.message(spec.created_verb) })),
    ))
}

async fn list(
    spec: &'static EntitySpec,
    state: Arc<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let records = bounded(&state, state.gateway.list_records(spec.entity)).await?;
    Ok(Json(records))
}

async fn fetch_one(
    spec: &'static EntitySpec,
    state: Arc<AppState>,
    id: String,
) -> Result<impl IntoResponse, AppError> {
    let record = bounded(&state, state.gateway.get_record(spec.entity, id.trim())).await?;
    Ok(Json(record))
}

async fn update(
    spec: &'static EntitySpec,
    state: Arc<AppState>,
    id: String,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let patch = spec.writable(&body_object(body)?);
    if patch.is_empty() {
        return Err(AppError::BadRequest(format!(
            "no writable fields; expected one of: {}",
            spec.fields.join(", ")
        )));
    }
    bounded(&state, state.gateway.update_record(spec.entity, id.trim(), patch)).await?;
    Ok(Json(json!({ "message": spec.message("updated") })))
}

async fn delete(
    spec: &'static EntitySpec,
    state: Arc<AppState>,
    id: String,
) -> Result<impl IntoResponse, AppError> {
    bounded(&state, state.gateway.delete_record(spec.entity, id.trim())).await?;
    Ok(Json(json!({ "message": spec.message("deleted") })))
}

/// `GET /api/campaigns/{id}/events` — every event tracked for a campaign.
pub async fn campaign_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let events = bounded(
        &state,
        state
            .gateway
            .find_records(Entity::Events, EVENT_CAMPAIGN_COLUMN, id.trim()),
    )
    .await?;
    Ok(Json(events))
}
