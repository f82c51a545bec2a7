//! Prometheus metrics recording and background collection.

use metrics::{counter, gauge, histogram};
use reviewlens_core::storage::ReviewStore;
use std::time::Duration;

/// Records HTTP request metrics.
pub fn record_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Records a write operation metric.
pub fn record_write_operation(operation: &str) {
    counter!("reviewlens_operations_total", "operation" => operation.to_string()).increment(1);
}

/// Records a listing or ranking query and how many reviews it returned.
pub fn record_query(kind: &str, results: usize) {
    counter!("reviewlens_queries_total", "type" => kind.to_string()).increment(1);
    histogram!("reviewlens_query_results", "type" => kind.to_string()).record(results as f64);
}

/// Updates store-level Prometheus gauges.
pub fn update_store_metrics(store: &ReviewStore) {
    gauge!("reviewlens_reviews_total").set(store.len() as f64);
    gauge!("reviewlens_wal_size_bytes").set(store.wal_size_bytes() as f64);
}
