use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use campaign_core::entity::ENTITIES;

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// CRUD routes are generated from the entity table; the metrics routes and
/// the campaign-events lookup are registered explicitly.
///
/// Middleware, outermost first:
///
/// 1. `CorsLayer` — the dashboard is served from another origin. With no
///    `CAMPAIGN_CORS_ORIGINS` configured every origin is allowed.
/// 2. `TraceLayer` — structured request/response logging via `tracing`.
pub fn build_app(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/metrics", get(routes::metrics::get_metrics))
        .route("/api/v1/campaign-metrics", get(routes::metrics::get_metrics))
        .route("/api/metrics/shaped", get(routes::metrics::get_shaped_metrics))
        .route(
            "/api/campaigns/{id}/events",
            get(routes::crud::campaign_events),
        );

    for &spec in ENTITIES {
        router = router.merge(routes::crud::entity_routes(spec));
    }

    let cors = cors_layer(&state.config.cors_origins);
    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}
