//! Prometheus metrics for mirage-http.
//!
//! Tracks how the protocol stack routes requests so a suite can check that
//! nothing slipped past interception.
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Offers made to protocol handlers
    pub static ref INTERCEPTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "mirage_interceptions_total",
        "Total number of requests offered to protocol handlers",
        &["handler", "outcome"]  // outcome: claimed|declined
    )
    .unwrap();

    /// Requests no handler claimed
    pub static ref FALLTHROUGH_TOTAL: IntCounterVec = register_int_counter_vec!(
        "mirage_fallthrough_total",
        "Total number of requests no protocol handler claimed",
        &["route"]  // route: transport|unsupported
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_offer(handler: &str, claimed: bool) {
    let outcome = if claimed { "claimed" } else { "declined" };
    INTERCEPTIONS_TOTAL
        .with_label_values(&[handler, outcome])
        .inc();
}

pub fn record_fallthrough(has_transport: bool) {
    let route = if has_transport {
        "transport"
    } else {
        "unsupported"
    };
    FALLTHROUGH_TOTAL.with_label_values(&[route]).inc();
}
