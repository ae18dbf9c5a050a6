use anyhow::Result;
use serde_json::Value;

use campaign_core::metrics::{MetricRow, MetricsFilter, MetricsSource};

use crate::{schema::METRIC_COLUMNS, DuckDbGateway};

/// Literal text stored in `metric_value` for a JSON value.
fn value_to_text(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

fn sequence_to_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl DuckDbGateway {
    /// Read rows of one metrics source for a client, in insertion order.
    pub async fn select_metrics_inner(
        &self,
        source: MetricsSource,
        filter: &MetricsFilter,
    ) -> Result<Vec<MetricRow>> {
        let conn = self.conn.lock().await;

        let mut params = vec![filter.client_code.clone()];
        let mut sql = format!(
            "SELECT {METRIC_COLUMNS} FROM {} WHERE client_code = ?1",
            source.table()
        );
        if let Some(date) = filter.date_event_str() {
            sql.push_str(" AND date_event = CAST(?2 AS DATE)");
            params.push(date);
        }
        sql.push_str(" ORDER BY rowid");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(duckdb::params_from_iter(params.iter()), |row| {
            let sequence: Option<i64> = row.get(6)?;
            Ok(MetricRow {
                client_code: row.get(0)?,
                metric_name: row.get(1)?,
                metric_value: row.get::<_, Option<String>>(2)?.map(Value::String),
                metric_type: row.get(3)?,
                metric_category: row.get(4)?,
                chart: row.get(5)?,
                sequence: sequence.map(Value::from),
                date_event: row.get(7)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Append rows to the `events_metrics` aggregate.
    ///
    /// Upstream aggregation owns this table in production; this is the
    /// loading path for fixtures and local imports.
    pub async fn insert_metric_rows(&self, rows: &[MetricRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        for row in rows {
            tx.execute(
                "INSERT INTO events_metrics (client_code, metric_name, metric_value, metric_type, \
                 metric_category, chart, sequence, date_event) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, CAST(?8 AS DATE))",
                duckdb::params![
                    row.client_code,
                    row.metric_name,
                    value_to_text(row.metric_value.as_ref()),
                    row.metric_type,
                    row.metric_category,
                    row.chart,
                    sequence_to_int(row.sequence.as_ref()),
                    row.date_event,
                ],
            )?;
        }
        tx.commit()?;
        tracing::info!(count = rows.len(), "Inserted metric rows into events_metrics");
        Ok(())
    }

    /// Rebuild `events_metrics_mv` from `events_metrics`.
    ///
    /// Delete and re-insert run in one transaction, so readers see either
    /// the old snapshot or the new one.
    pub async fn refresh_materialized_metrics(&self) -> Result<usize> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM events_metrics_mv", [])?;
        let copied = tx.execute(
            "INSERT INTO events_metrics_mv SELECT * FROM events_metrics ORDER BY rowid",
            [],
        )?;
        tx.commit()?;
        tracing::info!(rows = copied, "Refreshed events_metrics_mv");
        Ok(copied)
    }
}
