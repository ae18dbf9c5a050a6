#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use campaign_core::{
    config::{Backend, Config},
    entity::{Entity, Record},
    gateway::PersistenceGateway,
    metrics::{MetricRow, MetricsFilter, MetricsSource},
    query::FallbackPolicy,
};
use campaign_duckdb::DuckDbGateway;
use campaign_server::{app::build_app, state::AppState};

pub fn test_config(policy: FallbackPolicy) -> Config {
    Config {
        port: 0,
        backend: Backend::DuckDb,
        data_dir: "/tmp/campaign-test".to_string(),
        duckdb_memory_limit: "1GB".to_string(),
        metrics_fallback: policy,
        gateway_timeout_ms: 5000,
        cors_origins: vec![],
    }
}

/// Wraps the DuckDB gateway and counts metric reads per source.
pub struct CountingGateway {
    pub inner: Arc<DuckDbGateway>,
    pub materialized_reads: AtomicUsize,
    pub aggregate_reads: AtomicUsize,
    pub fail_metrics: bool,
}

impl CountingGateway {
    pub fn new(inner: Arc<DuckDbGateway>) -> Self {
        Self {
            inner,
            materialized_reads: AtomicUsize::new(0),
            aggregate_reads: AtomicUsize::new(0),
            fail_metrics: false,
        }
    }

    pub fn failing(inner: Arc<DuckDbGateway>) -> Self {
        Self {
            fail_metrics: true,
            ..Self::new(inner)
        }
    }

    pub fn reads(&self) -> (usize, usize) {
        (
            self.materialized_reads.load(Ordering::SeqCst),
            self.aggregate_reads.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl PersistenceGateway for CountingGateway {
    async fn select_metrics(
        &self,
        source: MetricsSource,
        filter: &MetricsFilter,
    ) -> anyhow::Result<Vec<MetricRow>> {
        match source {
            MetricsSource::Materialized => self.materialized_reads.fetch_add(1, Ordering::SeqCst),
            MetricsSource::Aggregate => self.aggregate_reads.fetch_add(1, Ordering::SeqCst),
        };
        if self.fail_metrics {
            anyhow::bail!("connection refused");
        }
        self.inner.select_metrics(source, filter).await
    }

    async fn insert_record(&self, entity: Entity, record: Record) -> anyhow::Result<()> {
        self.inner.insert_record(entity, record).await
    }

    async fn list_records(&self, entity: Entity) -> anyhow::Result<Vec<Record>> {
        self.inner.list_records(entity).await
    }

    async fn get_record(&self, entity: Entity, id: &str) -> anyhow::Result<Record> {
        self.inner.get_record(entity, id).await
    }

    async fn update_record(&self, entity: Entity, id: &str, patch: Record) -> anyhow::Result<()> {
        self.inner.update_record(entity, id, patch).await
    }

    async fn delete_record(&self, entity: Entity, id: &str) -> anyhow::Result<()> {
        self.inner.delete_record(entity, id).await
    }

    async fn find_records(
        &self,
        entity: Entity,
        column: &str,
        value: &str,
    ) -> anyhow::Result<Vec<Record>> {
        self.inner.find_records(entity, column, value).await
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.inner.ping().await
    }
}

/// Fresh in-memory backend + app for each test.
pub fn setup(policy: FallbackPolicy) -> (Arc<DuckDbGateway>, axum::Router) {
    let db = Arc::new(DuckDbGateway::open_in_memory().expect("in-memory DuckDB"));
    let state = Arc::new(AppState::new(db.clone(), test_config(policy)));
    (db, build_app(state))
}

/// Like [`setup`] but routes every gateway call through a [`CountingGateway`].
pub fn setup_counting(
    policy: FallbackPolicy,
    failing: bool,
) -> (Arc<DuckDbGateway>, Arc<CountingGateway>, axum::Router) {
    let db = Arc::new(DuckDbGateway::open_in_memory().expect("in-memory DuckDB"));
    let counting = Arc::new(if failing {
        CountingGateway::failing(db.clone())
    } else {
        CountingGateway::new(db.clone())
    });
    let state = Arc::new(AppState::new(counting.clone(), test_config(policy)));
    (db, counting, build_app(state))
}

pub async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
