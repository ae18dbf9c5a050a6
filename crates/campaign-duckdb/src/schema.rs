/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit`
/// (env `CAMPAIGN_DUCKDB_MEMORY`, default `"1GB"`).
///
/// Column names on `campaigns` and `events` keep the camelCase keys the
/// dashboard writes (`startDate`, `campaignId`, ...), so they are quoted.
///
/// DuckDB has no materialized views: `events_metrics_mv` is a plain table
/// with the same columns as `events_metrics`, rebuilt by
/// `DuckDbGateway::refresh_materialized_metrics`.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- CAMPAIGNS
-- ===========================================
CREATE TABLE IF NOT EXISTS campaigns (
    id              VARCHAR PRIMARY KEY,           -- uuid v4, server generated
    "name"          VARCHAR,
    "description"   VARCHAR,
    "startDate"     VARCHAR,
    "endDate"       VARCHAR,
    created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- ===========================================
-- EVENTS (raw tracked interactions)
-- ===========================================
CREATE TABLE IF NOT EXISTS events (
    id              VARCHAR PRIMARY KEY,
    "type"          VARCHAR,
    "campaignId"    VARCHAR,
    "userId"        VARCHAR,
    created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_events_campaign ON events("campaignId");

-- ===========================================
-- METRICS (aggregated upstream, read-only to the API)
-- ===========================================
-- metric_value is VARCHAR: upstream writes numbers and text alike, and the
-- API hands the literal value back to the dashboard.
CREATE TABLE IF NOT EXISTS events_metrics (
    client_code     VARCHAR NOT NULL,
    metric_name     VARCHAR,
    metric_value    VARCHAR,
    metric_type     VARCHAR,                       -- single_value | time_series | category
    metric_category VARCHAR,
    chart           VARCHAR,
    sequence        BIGINT,
    date_event      DATE
);
CREATE INDEX IF NOT EXISTS idx_events_metrics_client ON events_metrics(client_code, date_event);

CREATE TABLE IF NOT EXISTS events_metrics_mv (
    client_code     VARCHAR NOT NULL,
    metric_name     VARCHAR,
    metric_value    VARCHAR,
    metric_type     VARCHAR,
    metric_category VARCHAR,
    chart           VARCHAR,
    sequence        BIGINT,
    date_event      DATE
);
CREATE INDEX IF NOT EXISTS idx_events_metrics_mv_client ON events_metrics_mv(client_code, date_event);
"#
    )
}

/// Column list shared by both metric sources, in `MetricRow` field order.
pub const METRIC_COLUMNS: &str = "client_code, metric_name, metric_value, metric_type, \
     metric_category, chart, sequence, CAST(date_event AS VARCHAR)";
