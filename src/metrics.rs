//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("chirp_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "chirp_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Domain Metrics
    pub static ref TWEETS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("chirp_tweets_total", "Total number of tweets created"),
        &["kind"]
    ).expect("metric can be created");
    pub static ref TWEETS_DELETED_TOTAL: IntCounter = IntCounter::new(
        "chirp_tweets_deleted_total",
        "Total number of tweets soft-deleted"
    ).expect("metric can be created");
    pub static ref LIKES_TOTAL: IntCounter = IntCounter::new(
        "chirp_likes_total",
        "Total number of likes recorded"
    ).expect("metric can be created");
    pub static ref HASHTAGS_CREATED_TOTAL: IntCounter = IntCounter::new(
        "chirp_hashtags_created_total",
        "Total number of hashtags created"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("chirp_errors_total", "Total number of errors returned to clients"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Initialize metrics registry.
///
/// Safe to call more than once; only the first call registers.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
            .expect("HTTP_REQUESTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
            .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
        REGISTRY
            .register(Box::new(TWEETS_TOTAL.clone()))
            .expect("TWEETS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(TWEETS_DELETED_TOTAL.clone()))
            .expect("TWEETS_DELETED_TOTAL can be registered");
        REGISTRY
            .register(Box::new(LIKES_TOTAL.clone()))
            .expect("LIKES_TOTAL can be registered");
        REGISTRY
            .register(Box::new(HASHTAGS_CREATED_TOTAL.clone()))
            .expect("HASHTAGS_CREATED_TOTAL can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_metrics_is_idempotent() {
        init_metrics();
        init_metrics();

        TWEETS_TOTAL.with_label_values(&["original"]).inc();
        let families = REGISTRY.gather();
        assert!(
            families
                .iter()
                .any(|family| family.get_name() == "chirp_tweets_total")
        );
    }
}
