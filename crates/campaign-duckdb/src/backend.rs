use std::sync::Arc;

use anyhow::Result;
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use crate::schema::init_sql;

/// A DuckDB-backed persistence gateway.
///
/// The connection is wrapped in `Arc<Mutex<_>>` so the struct can be shared
/// across Axum handlers while DuckDB sees one statement at a time.
///
/// Memory and thread limits are enforced by [`init_sql`] at open time.
pub struct DuckDbGateway {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DuckDbGateway {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(
            "DuckDB opened at {} with memory_limit={}, threads=2",
            path, memory_limit
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an **in-memory** DuckDB database.
    ///
    /// Intended for tests only; data is discarded when the struct is dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Execute `SELECT 1` as a lightweight liveness check.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Acquire the DuckDB connection lock for direct queries.
    ///
    /// Intended for integration tests that need to verify stored data or
    /// break a table on purpose.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
