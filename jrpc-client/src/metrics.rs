//! Client metrics definitions
//!
//! OpenTelemetry instruments recorded by the correlator and the HTTP client.
//! They are exported through whatever meter provider is installed globally,
//! normally the one set up by `ClientBuilder::with_observability()`.
//!
//! # Metrics Collected
//!
//! - **calls_total**: settled calls by method and status (counter)
//! - **call_duration**: time from submission to settlement (histogram)
//! - **timeouts_total**: calls rejected by their timeout (counter)
//! - **batch_size**: messages per drained payload (histogram)
//! - **transport_errors_total**: failed exchanges with the peer (counter)
//!
//! Status is one of `success`, `error`, `timeout` or `cancelled`.

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Client metrics for monitoring
pub struct ClientMetrics {
    /// Settled calls
    pub calls_total: Counter<u64>,
    /// Call duration in seconds
    pub call_duration: Histogram<f64>,
    /// Calls rejected by timeout
    pub timeouts_total: Counter<u64>,
    /// Messages per outgoing payload
    pub batch_size: Histogram<u64>,
    /// Transport failures
    pub transport_errors_total: Counter<u64>,
}

impl ClientMetrics {
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
            calls_total: meter
                .u64_counter("jrpc.client.calls.total")
                .with_description("Total number of settled calls")
                .build(),
            call_duration: meter
                .f64_histogram("jrpc.client.call.duration")
                .with_description("Time from submission to settlement in seconds")
                .build(),
            timeouts_total: meter
                .u64_counter("jrpc.client.timeouts.total")
                .with_description("Total number of calls rejected by timeout")
                .build(),
            batch_size: meter
                .u64_histogram("jrpc.client.batch.size")
                .with_description("Number of messages per outgoing payload")
                .build(),
            transport_errors_total: meter
                .u64_counter("jrpc.client.transport.errors.total")
                .with_description("Total number of failed exchanges")
                .build(),
        }
    }

    /// Record a settled call
    pub fn record_call(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.calls_total.add(1, attributes);
        self.call_duration.record(duration_secs, attributes);

        if status == "timeout" {
            self.timeouts_total
                .add(1, &[KeyValue::new("method", method.to_string())]);
        }
    }

    /// Record a drained payload
    pub fn record_batch(&self, size: u64) {
        self.batch_size.record(size, &[]);
    }

    /// Record a transport failure
    pub fn record_transport_error(&self) {
        self.transport_errors_total.add(1, &[]);
    }
}
