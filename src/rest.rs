//! HTTP client for the hosted REST backend

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_RANGE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::error::{MediDashError, Result};
use crate::metrics::MetricsCollector;
use crate::query::QueryBuilder;
use crate::repository::DataClient;

/// Error body returned by the backend on a non-2xx status
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "error_description", alias = "msg")]
    pub description: Option<String>,
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

/// Turn a non-success response into [`MediDashError::Api`]
pub(crate) async fn api_error(response: Response) -> MediDashError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();

    let message = body
        .message
        .or(body.description)
        .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    debug!(
        status = status.as_u16(),
        code = ?body.code,
        details = ?body.details,
        hint = ?body.hint,
        "Backend returned an error"
    );

    MediDashError::Api { status: status.as_u16(), message }
}

/// Filter parameters only, without projection, ordering or paging
fn filter_params(query: &QueryBuilder) -> Vec<(String, String)> {
    query
        .to_params()
        .into_iter()
        .filter(|(key, _)| !matches!(key.as_str(), "select" | "order" | "limit" | "offset"))
        .collect()
}

/// Total from a `Content-Range` header such as `0-24/1500` or `*/1500`
fn content_range_total(header: &str) -> Option<usize> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

/// [`DataClient`] over `{url}/rest/v1/{table}`
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
    metrics: MetricsCollector,
}

impl RestClient {
    pub fn new(config: &BackendConfig, metrics: MetricsCollector) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: None,
            metrics,
        })
    }

    /// Send requests as the signed-in user instead of the anonymous role
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.http
            .request(method, format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn execute(&self, table: &str, operation: &'static str, request: RequestBuilder) -> Result<Vec<Value>> {
        let started = Instant::now();
        let outcome = self.send(request).await;
        let elapsed = started.elapsed();

        self.metrics.record_backend_request(table, operation, elapsed, outcome.is_ok());
        match &outcome {
            Ok(rows) => debug!(table, operation, rows = rows.len(), duration_ms = elapsed.as_millis(), "Backend request"),
            Err(e) => warn!(table, operation, error = %e, "Backend request failed"),
        }
        outcome
    }

    async fn send_count(&self, table: &str, request: RequestBuilder) -> Result<usize> {
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let header = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        content_range_total(header).ok_or_else(|| MediDashError::UnexpectedResponse {
            table: table.to_string(),
            detail: format!("no row total in Content-Range {header:?}"),
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<Value>> {
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<Value>(&text)? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            row => Ok(vec![row]),
        }
    }
}

#[async_trait]
impl DataClient for RestClient {
    async fn select(&self, table: &str, query: &QueryBuilder) -> Result<Vec<Value>> {
        let request = self.request(Method::GET, table).query(&query.to_params());
        self.execute(table, "select", request).await
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        let request = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&rows);
        self.execute(table, "insert", request).await
    }

    async fn update(&self, table: &str, query: &QueryBuilder, changes: Value) -> Result<Vec<Value>> {
        // only filters apply to a PATCH, never paging or projection
        let request = self
            .request(Method::PATCH, table)
            .query(&filter_params(query))
            .header("Prefer", "return=representation")
            .json(&changes);
        self.execute(table, "update", request).await
    }

    async fn count(&self, table: &str, query: &QueryBuilder) -> Result<usize> {
        let mut params = filter_params(query);
        params.push(("limit".to_string(), "0".to_string()));
        let request = self
            .request(Method::GET, table)
            .query(&params)
            .header("Prefer", "count=exact");

        let started = Instant::now();
        let outcome = self.send_count(table, request).await;
        let elapsed = started.elapsed();

        self.metrics.record_backend_request(table, "count", elapsed, outcome.is_ok());
        match &outcome {
            Ok(total) => debug!(table, total, duration_ms = elapsed.as_millis(), "Backend count"),
            Err(e) => warn!(table, error = %e, "Backend count failed"),
        }
        outcome
    }
}
