//! In-process [`DataClient`] holding tables as JSON rows

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Local, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{MediDashError, Result};
use crate::query::QueryBuilder;
use crate::repository::DataClient;
use crate::schema;

/// Tables kept in memory, with the backend's insert defaults applied
#[derive(Debug, Default)]
pub struct MemoryClient {
    tables: Mutex<HashMap<String, Vec<Value>>>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows as-is, bypassing defaults
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) -> Result<()> {
        let mut tables = self.lock()?;
        tables.entry(table.to_string()).or_default().extend(rows);
        Ok(())
    }

    /// Copy of every row in `table`
    pub fn rows(&self, table: &str) -> Result<Vec<Value>> {
        Ok(self.lock()?.get(table).cloned().unwrap_or_default())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<Value>>>> {
        self.tables
            .lock()
            .map_err(|_| MediDashError::Other("memory tables lock poisoned".to_string()))
    }
}

fn apply_defaults(table: &str, row: &mut Map<String, Value>) {
    let now = Utc::now().to_rfc3339();
    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();

    let mut default = |column: &str, value: Value| {
        if matches!(row.get(column), None | Some(Value::Null)) {
            row.insert(column.to_string(), value);
        }
    };

    default("id", Value::String(Uuid::new_v4().to_string()));
    default("created_at", Value::String(now.clone()));
    default("updated_at", Value::String(now));

    match table {
        schema::appointments::TABLE => default(schema::appointments::STATUS, Value::from("pending")),
        schema::documents::TABLE => default(schema::documents::VERIFICATION_STATUS, Value::from("pending")),
        schema::prescriptions::TABLE => default(schema::prescriptions::PRESCRIPTION_DATE, Value::from(today)),
        schema::medical_records::TABLE => default(schema::medical_records::RECORD_DATE, Value::from(today)),
        _ => {},
    }
}

#[async_trait]
impl DataClient for MemoryClient {
    async fn select(&self, table: &str, query: &QueryBuilder) -> Result<Vec<Value>> {
        let tables = self.lock()?;
        Ok(tables.get(table).map(|rows| query.apply(rows)).unwrap_or_default())
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let Value::Object(mut map) = row else {
                return Err(MediDashError::validation(format!("rows for {table} must be JSON objects")));
            };
            apply_defaults(table, &mut map);
            stored.push(Value::Object(map));
        }

        let mut tables = self.lock()?;
        tables.entry(table.to_string()).or_default().extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn update(&self, table: &str, query: &QueryBuilder, changes: Value) -> Result<Vec<Value>> {
        let Value::Object(changes) = changes else {
            return Err(MediDashError::validation(format!("changes for {table} must be a JSON object")));
        };

        let mut tables = self.lock()?;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let now = Value::String(Utc::now().to_rfc3339());
        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| query.matches(row)) {
            if let Value::Object(map) = row {
                for (column, value) in &changes {
                    map.insert(column.clone(), value.clone());
                }
                map.insert("updated_at".to_string(), now.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn count(&self, table: &str, query: &QueryBuilder) -> Result<usize> {
        let tables = self.lock()?;
        Ok(tables.get(table).map_or(0, |rows| rows.iter().filter(|row| query.matches(row)).count()))
    }
}
