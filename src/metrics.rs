use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};

/// Backend requests, labelled by table, operation and status
pub const BACKEND_REQUESTS_TOTAL: &str = "medidash_backend_requests_total";
/// Backend request latency in seconds
pub const BACKEND_REQUEST_DURATION: &str = "medidash_backend_request_duration_seconds";
/// Forms rejected by client-side validation
pub const FORM_REJECTIONS_TOTAL: &str = "medidash_form_rejections_total";
/// Appointments written to the local demo store
pub const FALLBACK_WRITES_TOTAL: &str = "medidash_fallback_writes_total";
/// Errors surfaced to the user
pub const ERRORS_TOTAL: &str = "medidash_errors_total";

#[derive(Debug, Default)]
struct Tally {
    backend_requests: AtomicU64,
    backend_failures: AtomicU64,
    form_rejections: AtomicU64,
    fallback_writes: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time copy of the in-process counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub backend_requests: u64,
    pub backend_failures: u64,
    pub form_rejections: u64,
    pub fallback_writes: u64,
    pub errors: u64,
}

/// Metrics collection and management
///
/// Every call goes to the `metrics` facade and to a local tally. Without an
/// installed recorder the facade calls are no-ops, so the tally is what the CLI
/// reports at the end of a command.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    tally: Arc<Tally>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one request against a backend table
    pub fn record_backend_request(&self, table: &str, operation: &'static str, duration: Duration, success: bool) {
        let status = if success { "success" } else { "error" };

        counter!(
            BACKEND_REQUESTS_TOTAL,
            "table" => table.to_owned(),
            "operation" => operation,
            "status" => status
        )
        .increment(1);
        histogram!(BACKEND_REQUEST_DURATION, "table" => table.to_owned(), "operation" => operation)
            .record(duration.as_secs_f64());

        self.tally.backend_requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.tally.backend_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a form submission refused before reaching the backend
    pub fn record_form_rejection(&self, form: &'static str) {
        counter!(FORM_REJECTIONS_TOTAL, "form" => form).increment(1);
        self.tally.form_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a booking diverted to the local demo store
    pub fn record_fallback_write(&self) {
        counter!(FALLBACK_WRITES_TOTAL).increment(1);
        self.tally.fallback_writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an error shown to the user
    pub fn record_error(&self, kind: &'static str) {
        counter!(ERRORS_TOTAL, "type" => kind).increment(1);
        self.tally.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            backend_requests: self.tally.backend_requests.load(Ordering::Relaxed),
            backend_failures: self.tally.backend_failures.load(Ordering::Relaxed),
            form_rejections: self.tally.form_rejections.load(Ordering::Relaxed),
            fallback_writes: self.tally.fallback_writes.load(Ordering::Relaxed),
            errors: self.tally.errors.load(Ordering::Relaxed),
        }
    }
}
