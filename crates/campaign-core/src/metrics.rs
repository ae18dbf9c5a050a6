//! Metric rows as returned by the aggregate sources.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One observation from an aggregate source.
///
/// Rows come from upstream aggregation and are treated as untrusted: every
/// field except `client_code` may be missing, and `metric_value` may be a
/// JSON number or a string. Nothing is coerced here; see
/// [`crate::shaping`] for the projection rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    #[serde(default)]
    pub client_code: String,
    #[serde(default)]
    pub metric_name: Option<String>,
    #[serde(default)]
    pub metric_value: Option<Value>,
    #[serde(default)]
    pub metric_type: Option<String>,
    #[serde(default)]
    pub metric_category: Option<String>,
    #[serde(default)]
    pub chart: Option<String>,
    #[serde(default)]
    pub sequence: Option<Value>,
    #[serde(default)]
    pub date_event: Option<String>,
}

/// Presentation shape a row is routed to, decided by `metric_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    SingleValue,
    TimeSeries,
    Category,
}

impl MetricKind {
    /// Normalize (trim + lowercase) and classify a raw `metric_type`.
    ///
    /// Returns `None` for blank or unrecognized types.
    pub fn classify(raw: Option<&str>) -> Option<Self> {
        match raw?.trim().to_ascii_lowercase().as_str() {
            "single_value" => Some(Self::SingleValue),
            "time_series" => Some(Self::TimeSeries),
            "category" => Some(Self::Category),
            _ => None,
        }
    }
}

impl MetricRow {
    pub fn kind(&self) -> Option<MetricKind> {
        MetricKind::classify(self.metric_type.as_deref())
    }

    /// Build a row from an arbitrary JSON value without failing on odd
    /// field types.
    ///
    /// Text fields accept any scalar (numbers and booleans are stringified);
    /// `metric_value` and `sequence` are kept verbatim. Returns `None` when
    /// `value` is not an object.
    pub fn from_loose(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str| loose_text(obj.get(key));
        let raw = |key: &str| obj.get(key).filter(|v| !v.is_null()).cloned();
        Some(Self {
            client_code: text("client_code").unwrap_or_default(),
            metric_name: text("metric_name"),
            metric_value: raw("metric_value"),
            metric_type: text("metric_type"),
            metric_category: text("metric_category"),
            chart: text("chart"),
            sequence: raw("sequence"),
            date_event: text("date_event"),
        })
    }
}

fn loose_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// The two aggregate sources a metrics read can hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsSource {
    /// `events_metrics_mv`: precomputed, the fast path.
    Materialized,
    /// `events_metrics`: the slower aggregate, used as fallback.
    Aggregate,
}

impl MetricsSource {
    pub fn table(self) -> &'static str {
        match self {
            Self::Materialized => "events_metrics_mv",
            Self::Aggregate => "events_metrics",
        }
    }
}

impl std::fmt::Display for MetricsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// Filter applied identically to both aggregate sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsFilter {
    pub client_code: String,
    pub date_event: Option<NaiveDate>,
}

impl MetricsFilter {
    pub fn date_event_str(&self) -> Option<String> {
        self.date_event.map(|d| d.format("%Y-%m-%d").to_string())
    }
}

/// Parse a `date_event` query value (`YYYY-MM-DD`).
pub fn parse_date_event(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}
