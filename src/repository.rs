//! Generic data access over the hosted backend
//!
//! [`DataClient`] is the only seam between the dashboard workflows and the
//! backend. Typed helpers below convert between JSON rows and model types.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{MediDashError, Result};
use crate::query::QueryBuilder;

/// Row-level access to backend tables
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataClient: Send + Sync {
    /// Rows of `table` matching `query`
    async fn select(&self, table: &str, query: &QueryBuilder) -> Result<Vec<Value>>;

    /// Insert `rows` and return them as stored
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>>;

    /// Apply `changes` to every row matching `query` and return the updated rows
    async fn update(&self, table: &str, query: &QueryBuilder, changes: Value) -> Result<Vec<Value>>;

    /// Exact number of rows matching the filters of `query`, ignoring paging
    async fn count(&self, table: &str, query: &QueryBuilder) -> Result<usize>;
}

fn decode<T: DeserializeOwned>(table: &str, row: Value) -> Result<T> {
    serde_json::from_value(row).map_err(|e| MediDashError::UnexpectedResponse {
        table: table.to_string(),
        detail: e.to_string(),
    })
}

/// Every row matching `query`, decoded
pub async fn fetch_all<T: DeserializeOwned>(client: &dyn DataClient, table: &str, query: &QueryBuilder) -> Result<Vec<T>> {
    client
        .select(table, query)
        .await?
        .into_iter()
        .map(|row| decode(table, row))
        .collect()
}

/// The single row matching `query`, if any
pub async fn fetch_optional<T: DeserializeOwned>(
    client: &dyn DataClient, table: &str, query: &QueryBuilder,
) -> Result<Option<T>> {
    let mut rows = client.select(table, query).await?;
    match rows.len() {
        0 => Ok(None),
        1 => decode(table, rows.remove(0)).map(Some),
        n => Err(MediDashError::UnexpectedResponse {
            table: table.to_string(),
            detail: format!("expected at most one row, got {n}"),
        }),
    }
}

/// Insert one row and decode the stored representation
pub async fn insert_one<I, T>(client: &dyn DataClient, table: &str, row: &I) -> Result<T>
where
    I: Serialize + Sync,
    T: DeserializeOwned,
{
    let payload = serde_json::to_value(row)?;
    let mut stored = client.insert(table, vec![payload]).await?;
    if stored.len() != 1 {
        return Err(MediDashError::UnexpectedResponse {
            table: table.to_string(),
            detail: format!("insert returned {} rows", stored.len()),
        });
    }
    decode(table, stored.remove(0))
}

/// Apply a partial update and decode the affected rows
pub async fn update_where<C, T>(client: &dyn DataClient, table: &str, query: &QueryBuilder, changes: &C) -> Result<Vec<T>>
where
    C: Serialize + Sync,
    T: DeserializeOwned,
{
    let changes = serde_json::to_value(changes)?;
    client
        .update(table, query, changes)
        .await?
        .into_iter()
        .map(|row| decode(table, row))
        .collect()
}
