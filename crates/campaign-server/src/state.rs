use std::sync::Arc;

use campaign_core::{config::Config, gateway::PersistenceGateway, query::MetricsQueryService};

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// Holds no per-request data: metric rows are read fresh on every call and
/// nothing is cached between requests.
pub struct AppState {
    /// The persistence gateway, constructed in `main` (or by a test) and
    /// injected here.
    pub gateway: Arc<dyn PersistenceGateway>,

    /// Metrics reads with the configured fallback policy and timeout.
    pub metrics: MetricsQueryService,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, config: Config) -> Self {
        let metrics = MetricsQueryService::new(
            Arc::clone(&gateway),
            config.metrics_fallback,
            config.gateway_timeout(),
        );
        Self {
            gateway,
            metrics,
            config: Arc::new(config),
        }
    }
}
