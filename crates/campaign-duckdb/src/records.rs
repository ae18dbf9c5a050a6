use anyhow::{anyhow, bail, Result};
use serde_json::Value;

use campaign_core::entity::{Entity, EntitySpec, Record};

use crate::DuckDbGateway;

/// Quote a column name from an [`EntitySpec`].
///
/// Only declared field names ever reach SQL, never client-supplied keys.
fn quoted(column: &str) -> String {
    format!("\"{column}\"")
}

fn select_list(spec: &EntitySpec) -> String {
    let mut cols = vec!["id".to_string()];
    cols.extend(spec.fields.iter().map(|f| quoted(f)));
    cols.push("CAST(created_at AS VARCHAR)".to_string());
    cols.join(", ")
}

/// Store a JSON value in a VARCHAR column: strings verbatim, other scalars
/// and nested values as JSON text.
fn to_column(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn read_record(spec: &EntitySpec, row: &duckdb::Row<'_>) -> duckdb::Result<Record> {
    let mut record = Record::new();
    record.insert("id".to_string(), Value::String(row.get(0)?));
    for (i, field) in spec.fields.iter().enumerate() {
        let v: Option<String> = row.get(i + 1)?;
        record.insert(field.to_string(), v.map(Value::String).unwrap_or(Value::Null));
    }
    let created_at: String = row.get(spec.fields.len() + 1)?;
    record.insert("created_at".to_string(), Value::String(created_at));
    Ok(record)
}

fn checked_column<'a>(spec: &EntitySpec, column: &'a str) -> Result<&'a str> {
    if spec.fields.contains(&column) {
        Ok(column)
    } else {
        Err(anyhow!("unknown column {} on {}", column, spec.table))
    }
}

impl DuckDbGateway {
    pub async fn insert_record_inner(&self, entity: Entity, record: Record) -> Result<String> {
        let spec = entity.spec();
        let id = uuid::Uuid::new_v4().to_string();

        let mut columns = vec!["id".to_string()];
        let mut values: Vec<Option<String>> = vec![Some(id.clone())];
        for (key, value) in &record {
            columns.push(quoted(checked_column(spec, key)?));
            values.push(to_column(value));
        }
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{i}")).collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            spec.table,
            columns.join(", "),
            placeholders.join(", ")
        );
        let conn = self.conn.lock().await;
        conn.execute(&sql, duckdb::params_from_iter(values.iter()))?;
        Ok(id)
    }

    pub async fn list_records_inner(&self, entity: Entity) -> Result<Vec<Record>> {
        let spec = entity.spec();
        let sql = format!(
            "SELECT {} FROM {} ORDER BY created_at, id",
            select_list(spec),
            spec.table
        );
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| read_record(spec, row))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub async fn get_record_inner(&self, entity: Entity, id: &str) -> Result<Record> {
        let spec = entity.spec();
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", select_list(spec), spec.table);
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query_map(duckdb::params![id], |row| read_record(spec, row))?;
        match rows.next() {
            Some(row) => Ok(row?),
            None => Err(anyhow!("{} {} not found", spec.noun, id)),
        }
    }

    /// Apply `patch` to the record with `id`. Updating a missing id is a
    /// no-op, like an `UPDATE ... WHERE` that matches nothing.
    pub async fn update_record_inner(&self, entity: Entity, id: &str, patch: Record) -> Result<usize> {
        let spec = entity.spec();
        if patch.is_empty() {
            bail!("no writable fields in update");
        }

        let mut assignments = Vec::with_capacity(patch.len());
        let mut values: Vec<Option<String>> = Vec::with_capacity(patch.len() + 1);
        for (i, (key, value)) in patch.iter().enumerate() {
            assignments.push(format!("{} = ?{}", quoted(checked_column(spec, key)?), i + 1));
            values.push(to_column(value));
        }
        values.push(Some(id.to_string()));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            spec.table,
            assignments.join(", "),
            values.len()
        );
        let conn = self.conn.lock().await;
        let changed = conn.execute(&sql, duckdb::params_from_iter(values.iter()))?;
        Ok(changed)
    }

    pub async fn delete_record_inner(&self, entity: Entity, id: &str) -> Result<usize> {
        let spec = entity.spec();
        let sql = format!("DELETE FROM {} WHERE id = ?1", spec.table);
        let conn = self.conn.lock().await;
        let deleted = conn.execute(&sql, duckdb::params![id])?;
        Ok(deleted)
    }

    pub async fn find_records_inner(
        &self,
        entity: Entity,
        column: &str,
        value: &str,
    ) -> Result<Vec<Record>> {
        let spec = entity.spec();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1 ORDER BY created_at, id",
            select_list(spec),
            spec.table,
            quoted(checked_column(spec, column)?)
        );
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(duckdb::params![value], |row| read_record(spec, row))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}
