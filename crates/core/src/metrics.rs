//! Metrics definitions for the listing services.
//!
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

use crate::pagination::PageDirection;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "pages_served_total",
        "Total number of paginated windows returned to callers"
    );
    describe_counter!(
        "invalid_page_requests_total",
        "Total number of page requests rejected for bad cursors or arguments"
    );
    describe_counter!(
        "window_fetch_errors_total",
        "Total number of window fetches that failed in the backing store"
    );
    describe_histogram!(
        "window_fetch_duration_seconds",
        "Time taken to fetch and assemble one window in seconds"
    );
}

/// Record a window returned to a caller.
///
/// # Arguments
/// * `entity` - The listed entity ("articles", "feed", "comments")
/// * `direction` - Traversal direction of the request
pub fn record_page_served(entity: &'static str, direction: PageDirection) {
    counter!("pages_served_total", "entity" => entity, "direction" => direction.as_str())
        .increment(1);
}

/// Record a rejected page request.
pub fn record_invalid_page_request(entity: &'static str) {
    counter!("invalid_page_requests_total", "entity" => entity).increment(1);
}

/// Record a failed window fetch.
pub fn record_fetch_error(entity: &'static str) {
    counter!("window_fetch_errors_total", "entity" => entity).increment(1);
}

/// A timer that records the window fetch duration when dropped.
pub struct FetchTimer {
    entity: &'static str,
    start: Instant,
}

impl FetchTimer {
    /// Start a new timer for `entity`.
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            start: Instant::now(),
        }
    }
}

impl Drop for FetchTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        histogram!("window_fetch_duration_seconds", "entity" => self.entity).record(duration);
    }
}
