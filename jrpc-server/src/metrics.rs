//! Server metrics definitions
//!
//! OpenTelemetry instruments recorded by the dispatcher and the HTTP server.
//! All metrics are prefixed with `jrpc.server.*`.
//!
//! # Metrics Collected
//!
//! - **payloads_total**: payloads processed, by outcome (counter)
//! - **batch_size**: items per decoded payload (histogram)
//! - **requests_total**: requests dispatched, by method and status (counter)
//! - **request_duration**: handler run time (histogram)
//! - **errors_total**: error responses, by code (counter)
//! - **http_responses_total**: HTTP responses, by status (counter)
//!
//! # Examples
//!
//! ```rust,no_run
//! use jrpc_server::ServerMetrics;
//!
//! let metrics = ServerMetrics::new("calculator");
//! metrics.record_request("min", "success", 0.002);
//! ```

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Server metrics for monitoring
pub struct ServerMetrics {
    /// Payloads processed
    pub payloads_total: Counter<u64>,
    /// Items per payload
    pub batch_size: Histogram<u64>,
    /// Requests dispatched to handlers
    pub requests_total: Counter<u64>,
    /// Handler duration in seconds
    pub request_duration: Histogram<f64>,
    /// Error responses produced
    pub errors_total: Counter<u64>,
    /// HTTP responses sent
    pub http_responses_total: Counter<u64>,
}

impl ServerMetrics {
    /// Create metrics on the global meter for `service_name`
    pub fn new(service_name: impl Into<String>) -> Self {
        let meter = global::meter_with_scope(
            opentelemetry::InstrumentationScope::builder(service_name.into()).build(),
        );
        Self::new_with_meter(&meter)
    }

    /// Create metrics on a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            payloads_total: meter
                .u64_counter("jrpc.server.payloads.total")
                .with_description("Total number of payloads processed")
                .build(),
            batch_size: meter
                .u64_histogram("jrpc.server.batch.size")
                .with_description("Number of items per payload")
                .build(),
            requests_total: meter
                .u64_counter("jrpc.server.requests.total")
                .with_description("Total number of requests dispatched")
                .build(),
            request_duration: meter
                .f64_histogram("jrpc.server.request.duration")
                .with_description("Handler duration in seconds")
                .build(),
            errors_total: meter
                .u64_counter("jrpc.server.errors.total")
                .with_description("Total number of error responses")
                .build(),
            http_responses_total: meter
                .u64_counter("jrpc.server.http.responses.total")
                .with_description("Total number of HTTP responses by status")
                .build(),
        }
    }

    /// Record a decoded payload
    pub fn record_payload(&self, outcome: &str, size: u64) {
        self.payloads_total
            .add(1, &[KeyValue::new("outcome", outcome.to_string())]);
        self.batch_size.record(size, &[]);
    }

    /// Record a finished handler
    pub fn record_request(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record an error response
    pub fn record_error(&self, code: i32) {
        self.errors_total
            .add(1, &[KeyValue::new("code", i64::from(code))]);
    }

    /// Record an HTTP response
    pub fn record_http_response(&self, status: u16) {
        self.http_responses_total
            .add(1, &[KeyValue::new("status", i64::from(status))]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = ServerMetrics::new("test-server");

        // Just test that metrics can be recorded without a provider installed
        metrics.record_payload("batch", 3);
        metrics.record_payload("parse_error", 0);
        metrics.record_request("min", "success", 0.001);
        metrics.record_request("throwError", "error", 0.002);
        metrics.record_error(-32601);
        metrics.record_http_response(204);
    }
}
