//! Document store metrics.
//!
//! - Request counters by operation and status
//! - Latency histograms

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total store requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "jobboard_store_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "jobboard_store_latency_seconds";

    /// Auth token refreshes by outcome.
    pub const TOKEN_REFRESHES_TOTAL: &str = "jobboard_store_token_refreshes_total";
}

/// Record metrics for a completed store request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record an auth token refresh attempt.
pub fn record_token_refresh(success: bool) {
    counter!(
        names::TOKEN_REFRESHES_TOTAL,
        "outcome" => if success { "ok" } else { "error" }
    )
    .increment(1);
}
