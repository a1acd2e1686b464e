//! Prometheus metrics infrastructure for the cerberus signer.
//!
//! One registry, one subsystem: per-method RPC request counters (labeled
//! with the final status code) and request-duration histograms. The
//! `/metrics` endpoint is served by [`server::start_metrics_server`] on the
//! dedicated metrics port.

pub mod server;

pub use server::{spawn_metrics_server, start_metrics_server};

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, register_counter_vec_with_registry, register_histogram_vec_with_registry,
    CounterVec, HistogramVec, Registry,
};
use std::time::Instant;

/// Global Prometheus registry for all signer metrics.
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Total RPC requests, labeled by method and final status code.
pub static RPC_REQUEST_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec_with_registry!(
        "cerberus_rpc_server_request_total",
        "Total number of RPC server requests with status codes",
        &["method", "code"],
        &*REGISTRY
    )
    .expect("failed to register cerberus_rpc_server_request_total")
});

/// RPC request duration in seconds, labeled by method.
pub static RPC_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec_with_registry!(
        histogram_opts!(
            "cerberus_rpc_server_request_duration_seconds",
            "Duration of RPC server requests in seconds",
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
        ),
        &["method"],
        &*REGISTRY
    )
    .expect("failed to register cerberus_rpc_server_request_duration_seconds")
});

/// Initialize all metrics. Call once at startup so the first request does
/// not pay the registration cost.
pub fn init() {
    Lazy::force(&RPC_REQUEST_TOTAL);
    Lazy::force(&RPC_REQUEST_DURATION_SECONDS);
    tracing::info!("metrics initialized");
}

/// Times one RPC request and records it on completion.
///
/// Start a recorder when the handler is entered, then call
/// [`MethodRecorder::record`] with the final status code.
pub struct MethodRecorder {
    method: &'static str,
    start: Instant,
}

impl MethodRecorder {
    pub fn new(method: &'static str) -> Self {
        Self {
            method,
            start: Instant::now(),
        }
    }

    /// Record the request with its final status code label.
    pub fn record(self, code: &str) {
        RPC_REQUEST_TOTAL
            .with_label_values(&[self.method, code])
            .inc();
        RPC_REQUEST_DURATION_SECONDS
            .with_label_values(&[self.method])
            .observe(self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_increments_counter() {
        init();

        let before = RPC_REQUEST_TOTAL
            .with_label_values(&["test_method", "OK"])
            .get();

        let recorder = MethodRecorder::new("test_method");
        recorder.record("OK");

        let after = RPC_REQUEST_TOTAL
            .with_label_values(&["test_method", "OK"])
            .get();
        assert_eq!(after, before + 1.0);
    }

    #[test]
    fn test_duration_observed() {
        init();

        let recorder = MethodRecorder::new("timed_method");
        recorder.record("Internal");

        let histogram = RPC_REQUEST_DURATION_SECONDS.with_label_values(&["timed_method"]);
        assert!(histogram.get_sample_count() >= 1);
    }
}
