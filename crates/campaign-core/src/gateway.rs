//! Persistence gateway abstraction.

use async_trait::async_trait;

use crate::{
    entity::{Entity, Record},
    metrics::{MetricRow, MetricsFilter, MetricsSource},
};

/// Storage interface for metric reads and the pass-through CRUD tables.
///
/// Self-hosted mode uses the embedded DuckDB implementation; the managed
/// mode talks to a Supabase (PostgREST) project. Handlers receive the
/// gateway as an injected `Arc<dyn PersistenceGateway>` and never know
/// which one they hold.
#[async_trait]
pub trait PersistenceGateway: Send + Sync + 'static {
    /// Rows of `source` matching `filter`, in source order.
    async fn select_metrics(
        &self,
        source: MetricsSource,
        filter: &MetricsFilter,
    ) -> anyhow::Result<Vec<MetricRow>>;

    /// Insert one record; `record` holds only writable fields.
    async fn insert_record(&self, entity: Entity, record: Record) -> anyhow::Result<()>;

    async fn list_records(&self, entity: Entity) -> anyhow::Result<Vec<Record>>;

    /// Exactly one record; a missing id is an error.
    async fn get_record(&self, entity: Entity, id: &str) -> anyhow::Result<Record>;

    async fn update_record(&self, entity: Entity, id: &str, patch: Record)
        -> anyhow::Result<()>;

    async fn delete_record(&self, entity: Entity, id: &str) -> anyhow::Result<()>;

    /// Records whose `column` equals `value`. `column` must be one of the
    /// entity's declared fields.
    async fn find_records(
        &self,
        entity: Entity,
        column: &str,
        value: &str,
    ) -> anyhow::Result<Vec<Record>>;

    /// Cheap reachability check used by `/health`.
    async fn ping(&self) -> anyhow::Result<()>;
}
