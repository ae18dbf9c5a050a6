//! Metrics retrieval with fast-path / fallback sources.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::{
    error::{GatewayError, MetricsError, MISSING_CLIENT_CODE},
    gateway::PersistenceGateway,
    metrics::{MetricRow, MetricsFilter, MetricsSource},
};

/// When the slow aggregate is consulted after the materialized read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Strict contract: the materialized result (or its error) is final.
    Never,
    /// Fall back only when the materialized read returned no rows.
    OnEmpty,
    /// Fall back when the materialized read returned no rows or failed.
    #[default]
    OnEmptyOrError,
}

impl FallbackPolicy {
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some("none") => Ok(Self::Never),
            Some("on_empty") => Ok(Self::OnEmpty),
            Some("on_empty_or_error") => Ok(Self::OnEmptyOrError),
            Some(other) => Err(anyhow!(
                "metrics fallback must be one of: none, on_empty, on_empty_or_error (got {other})"
            )),
        }
    }

    fn fallback_reason(
        self,
        primary: &std::result::Result<Vec<MetricRow>, GatewayError>,
    ) -> Option<&'static str> {
        match (self, primary) {
            (Self::Never, _) => None,
            (_, Ok(rows)) if rows.is_empty() => Some("empty"),
            (Self::OnEmptyOrError, Err(_)) => Some("error"),
            _ => None,
        }
    }
}

/// Resolves metric rows for a client from the persistence gateway.
///
/// Stateless between calls: holds only the injected gateway and settings.
#[derive(Clone)]
pub struct MetricsQueryService {
    gateway: Arc<dyn PersistenceGateway>,
    policy: FallbackPolicy,
    timeout: Duration,
}

impl MetricsQueryService {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, policy: FallbackPolicy, timeout: Duration) -> Self {
        Self {
            gateway,
            policy,
            timeout,
        }
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Fetch rows for `client_code`, optionally restricted to one `date_event`.
    ///
    /// The materialized source is read first. Depending on the policy the
    /// aggregate source is read at most once afterwards. The first successful
    /// result wins; when both reads fail the aggregate's error is returned.
    pub async fn fetch_metrics(
        &self,
        client_code: Option<&str>,
        date_event: Option<NaiveDate>,
    ) -> std::result::Result<Vec<MetricRow>, MetricsError> {
        let client_code = client_code
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(MetricsError::MissingParameter(MISSING_CLIENT_CODE))?;

        let filter = MetricsFilter {
            client_code: client_code.to_string(),
            date_event,
        };

        let primary = self.query_source(MetricsSource::Materialized, &filter).await;
        let Some(reason) = self.policy.fallback_reason(&primary) else {
            return primary.map_err(MetricsError::from);
        };

        match &primary {
            Err(e) => warn!(
                client_code,
                reason,
                error = %e,
                "Materialized metrics read failed, falling back to aggregate"
            ),
            Ok(_) => debug!(client_code, reason, "No materialized metrics, falling back to aggregate"),
        }

        let fallback = self.query_source(MetricsSource::Aggregate, &filter).await;
        match (primary, fallback) {
            (_, Ok(rows)) => Ok(rows),
            (Ok(rows), Err(e)) => {
                warn!(
                    client_code,
                    error = %e,
                    "Aggregate metrics read failed, keeping materialized result"
                );
                Ok(rows)
            }
            (Err(_), Err(e)) => Err(MetricsError::from(e)),
        }
    }

    async fn query_source(
        &self,
        source: MetricsSource,
        filter: &MetricsFilter,
    ) -> std::result::Result<Vec<MetricRow>, GatewayError> {
        match tokio::time::timeout(self.timeout, self.gateway.select_metrics(source, filter)).await
        {
            Ok(Ok(rows)) => {
                debug!(source = %source, rows = rows.len(), "Metrics query complete");
                Ok(rows)
            }
            Ok(Err(e)) => Err(GatewayError::Query {
                source_table: source,
                message: format!("{e:#}"),
            }),
            Err(_) => Err(GatewayError::Timeout {
                source_table: source,
                timeout: self.timeout,
            }),
        }
    }
}
