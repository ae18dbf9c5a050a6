//! Persistence gateway backed by a Supabase project's PostgREST API.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Method, Response, Url};
use serde_json::Value;
use tracing::debug;

use campaign_core::{
    entity::{Entity, Record},
    gateway::PersistenceGateway,
    metrics::{MetricRow, MetricsFilter, MetricsSource},
};

/// `Accept` value that makes PostgREST return a single object and fail
/// unless exactly one row matches.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// HTTP client wrapper for PostgREST.
///
/// Every table is reached at `{url}/rest/v1/{table}`; filters are passed as
/// `column=eq.value` query-string pairs, which PostgREST binds as
/// parameters. The project key is sent both as `apikey` and as a bearer
/// token.
#[derive(Clone)]
pub struct SupabaseGateway {
    client: Client,
    url: String,
    key: String,
}

impl SupabaseGateway {
    pub fn new(url: &str, key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Supabase HTTP client")?;
        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
        })
    }

    /// `{url}/rest/v1/{table}` with `filters` appended as `column=eq.value`.
    fn table_url(&self, table: &str, select: bool, filters: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.url, table))
            .context("Invalid SUPABASE_URL")?;
        {
            let mut qs = url.query_pairs_mut();
            if select {
                qs.append_pair("select", "*");
            }
            for (column, value) in filters {
                qs.append_pair(column, &format!("eq.{value}"));
            }
        }
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<Value>, single: bool) -> Result<Response> {
        debug!(%method, %url, "PostgREST request");
        let mut req = self
            .client
            .request(method, url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key);
        if single {
            req = req.header(header::ACCEPT, SINGLE_OBJECT);
        }
        if let Some(body) = body {
            req = req.header("Prefer", "return=minimal").json(&body);
        }

        let resp = req.send().await.context("Supabase HTTP request failed")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("{}", error_message(status.as_u16(), &body));
        }
        Ok(resp)
    }

    async fn get_rows(&self, url: Url) -> Result<Vec<Value>> {
        let resp = self.send(Method::GET, url, None, false).await?;
        let json: Value = resp.json().await.context("Supabase response parse failed")?;
        match json {
            Value::Array(rows) => Ok(rows),
            other => Err(anyhow!("expected a JSON array from Supabase, got {other}")),
        }
    }
}

/// Prefer PostgREST's `message` field; fall back to the raw body.
fn error_message(status: u16, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    match parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
    {
        Some(msg) => msg.to_string(),
        None if body.is_empty() => format!("Supabase returned status {status}"),
        None => format!("Supabase error {status}: {body}"),
    }
}

fn into_records(rows: Vec<Value>) -> Vec<Record> {
    rows.into_iter()
        .filter_map(|row| match row {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

#[async_trait]
impl PersistenceGateway for SupabaseGateway {
    async fn select_metrics(
        &self,
        source: MetricsSource,
        filter: &MetricsFilter,
    ) -> Result<Vec<MetricRow>> {
        let date = filter.date_event_str();
        let mut filters = vec![("client_code", filter.client_code.as_str())];
        if let Some(date) = date.as_deref() {
            filters.push(("date_event", date));
        }
        let url = self.table_url(source.table(), true, &filters)?;
        let rows = self.get_rows(url).await?;
        Ok(rows.iter().filter_map(MetricRow::from_loose).collect())
    }

    async fn insert_record(&self, entity: Entity, record: Record) -> Result<()> {
        let url = self.table_url(entity.table(), false, &[])?;
        self.send(
            Method::POST,
            url,
            Some(Value::Array(vec![Value::Object(record)])),
            false,
        )
        .await?;
        Ok(())
    }

    async fn list_records(&self, entity: Entity) -> Result<Vec<Record>> {
        let url = self.table_url(entity.table(), true, &[])?;
        Ok(into_records(self.get_rows(url).await?))
    }

    async fn get_record(&self, entity: Entity, id: &str) -> Result<Record> {
        let url = self.table_url(entity.table(), true, &[("id", id)])?;
        let resp = self.send(Method::GET, url, None, true).await?;
        match resp.json::<Value>().await.context("Supabase response parse failed")? {
            Value::Object(map) => Ok(map),
            other => Err(anyhow!("expected a JSON object from Supabase, got {other}")),
        }
    }

    async fn update_record(&self, entity: Entity, id: &str, patch: Record) -> Result<()> {
        let url = self.table_url(entity.table(), false, &[("id", id)])?;
        self.send(Method::PATCH, url, Some(Value::Object(patch)), false)
            .await?;
        Ok(())
    }

    async fn delete_record(&self, entity: Entity, id: &str) -> Result<()> {
        let url = self.table_url(entity.table(), false, &[("id", id)])?;
        self.send(Method::DELETE, url, None, false).await?;
        Ok(())
    }

    async fn find_records(&self, entity: Entity, column: &str, value: &str) -> Result<Vec<Record>> {
        if !entity.spec().fields.contains(&column) {
            bail!("unknown column {} on {}", column, entity.table());
        }
        let url = self.table_url(entity.table(), true, &[(column, value)])?;
        Ok(into_records(self.get_rows(url).await?))
    }

    async fn ping(&self) -> Result<()> {
        let mut url = self.table_url(Entity::Campaigns.table(), false, &[])?;
        url.query_pairs_mut()
            .append_pair("select", "id")
            .append_pair("limit", "1");
        self.send(Method::GET, url, None, false).await?;
        Ok(())
    }
}
