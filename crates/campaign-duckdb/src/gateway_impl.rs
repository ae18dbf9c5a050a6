use async_trait::async_trait;

use campaign_core::{
    entity::{Entity, Record},
    gateway::PersistenceGateway,
    metrics::{MetricRow, MetricsFilter, MetricsSource},
};

use crate::DuckDbGateway;

#[async_trait]
impl PersistenceGateway for DuckDbGateway {
    async fn select_metrics(
        &self,
        source: MetricsSource,
        filter: &MetricsFilter,
    ) -> anyhow::Result<Vec<MetricRow>> {
        self.select_metrics_inner(source, filter).await
    }

    async fn insert_record(&self, entity: Entity, record: Record) -> anyhow::Result<()> {
        self.insert_record_inner(entity, record).await.map(|_| ())
    }

    async fn list_records(&self, entity: Entity) -> anyhow::Result<Vec<Record>> {
        self.list_records_inner(entity).await
    }

    async fn get_record(&self, entity: Entity, id: &str) -> anyhow::Result<Record> {
        self.get_record_inner(entity, id).await
    }

    async fn update_record(
        &self,
        entity: Entity,
        id: &str,
        patch: Record,
    ) -> anyhow::Result<()> {
        self.update_record_inner(entity, id, patch).await.map(|_| ())
    }

    async fn delete_record(&self, entity: Entity, id: &str) -> anyhow::Result<()> {
        self.delete_record_inner(entity, id).await.map(|_| ())
    }

    async fn find_records(
        &self,
        entity: Entity,
        column: &str,
        value: &str,
    ) -> anyhow::Result<Vec<Record>> {
        self.find_records_inner(entity, column, value).await
    }

    async fn ping(&self) -> anyhow::Result<()> {
        DuckDbGateway::ping(self).await
    }
}
