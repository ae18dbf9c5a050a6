pub mod backend;
pub mod gateway_impl;
pub mod metrics;
pub mod records;
pub mod schema;

pub use backend::DuckDbGateway;

/// Re-export the `duckdb` crate so tests can run raw statements without an
/// extra dependency.
pub use duckdb;
