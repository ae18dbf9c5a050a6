use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use campaign_core::gateway::PersistenceGateway;
use campaign_duckdb::DuckDbGateway;
use campaign_server::{
    config::{Backend, Config},
    state::AppState,
    supabase::SupabaseGateway,
};

/// `campaign-dashboard health` — liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$CAMPAIGN_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("CAMPAIGN_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

fn open_gateway(cfg: &Config) -> Result<Arc<dyn PersistenceGateway>> {
    match &cfg.backend {
        Backend::DuckDb => {
            std::fs::create_dir_all(&cfg.data_dir)?;
            let db_path = format!("{}/campaigns.db", cfg.data_dir);
            Ok(Arc::new(DuckDbGateway::open(&db_path, &cfg.duckdb_memory_limit)?))
        }
        Backend::Supabase { url, key } => {
            info!(url = %url, "Using Supabase backend");
            Ok(Arc::new(SupabaseGateway::new(url, key, cfg.gateway_timeout())?))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real deployments set the environment directly.
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }

    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("campaign=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let gateway = open_gateway(&cfg)?;

    if let Err(e) = gateway.ping().await {
        tracing::warn!(error = %e, "Persistence gateway not reachable at startup");
    }

    let addr = format!("0.0.0.0:{}", cfg.port);
    let port = cfg.port;
    let timeout_ms = cfg.gateway_timeout_ms;
    let state = Arc::new(AppState::new(gateway, cfg));
    info!(
        fallback = ?state.metrics.policy(),
        timeout_ms,
        "Metrics query policy"
    );
    let app = campaign_server::app::build_app(state);

    info!(port, "Campaign dashboard API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
