use std::time::Duration;

use thiserror::Error;

use crate::metrics::MetricsSource;

/// A failed read against one aggregate source.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{source_table} query failed: {message}")]
    Query {
        source_table: MetricsSource,
        message: String,
    },

    #[error("{source_table} query timed out after {}ms", .timeout.as_millis())]
    Timeout {
        source_table: MetricsSource,
        timeout: Duration,
    },
}

#[derive(Debug, Error)]
pub enum MetricsError {
    /// A required identifying parameter was absent or blank.
    #[error("{0}")]
    MissingParameter(&'static str),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Message returned when `client_code` is missing.
pub const MISSING_CLIENT_CODE: &str = "Client Code is required";
