//! Prometheus metrics for tide.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`: a registration failure means a
//! duplicate metric name, which must crash at startup. These panics only
//! occur during static initialization.

use crate::error::{TelemetryError, TelemetryResult};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, Encoder,
    HistogramVec, IntGauge, TextEncoder,
};

/// Conditional orders created.
/// Labels: kind, side
pub static ORDERS_CREATED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tide_orders_created_total",
        "Conditional orders created",
        &["kind", "side"]
    )
    .unwrap()
});

/// Conditional orders promoted to triggered.
/// Labels: kind, side
pub static ORDERS_TRIGGERED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tide_orders_triggered_total",
        "Conditional orders triggered by the price feed",
        &["kind", "side"]
    )
    .unwrap()
});

/// Local order cancellations.
pub static ORDERS_CANCELLED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tide_orders_cancelled_total",
        "Conditional orders cancelled locally",
        &["from"]
    )
    .unwrap()
});

/// Live (pending + triggered) orders.
pub static LIVE_ORDERS: Lazy<IntGauge> =
    Lazy::new(|| register_int_gauge!("tide_live_orders", "Live conditional orders").unwrap());

/// Script submissions.
/// Labels: op (swap/place/cancel/mint), result (ok/rejected/network)
pub static SUBMISSIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tide_submissions_total",
        "Transaction script submissions",
        &["op", "result"]
    )
    .unwrap()
});

/// Submission latency in milliseconds.
pub static SUBMISSION_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "tide_submission_latency_ms",
        "Signer round trip in milliseconds",
        &["op"],
        vec![50.0, 100.0, 250.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0, 30000.0]
    )
    .unwrap()
});

/// Builds refused before a script was produced.
/// Labels: kind (error category)
pub static BUILDS_REFUSED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tide_builds_refused_total",
        "Requests refused by pre-build validation",
        &["kind"]
    )
    .unwrap()
});

/// Price feed polls.
/// Labels: result (ok/error)
pub static PRICE_POLLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tide_price_polls_total",
        "Price feed polls",
        &["result"]
    )
    .unwrap()
});

/// Inventory refreshes.
/// Labels: result (ok/error)
pub static INVENTORY_REFRESH_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tide_inventory_refresh_total",
        "Coin inventory refreshes",
        &["result"]
    )
    .unwrap()
});

fn result_label(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    pub fn order_created(kind: &str, side: &str) {
        ORDERS_CREATED_TOTAL.with_label_values(&[kind, side]).inc();
    }

    pub fn order_triggered(kind: &str, side: &str) {
        ORDERS_TRIGGERED_TOTAL.with_label_values(&[kind, side]).inc();
    }

    pub fn order_cancelled(from: &str) {
        ORDERS_CANCELLED_TOTAL.with_label_values(&[from]).inc();
    }

    pub fn live_orders(count: usize) {
        LIVE_ORDERS.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Record a submission outcome and its latency.
    pub fn submission(op: &str, result: &str, latency_ms: f64) {
        SUBMISSIONS_TOTAL.with_label_values(&[op, result]).inc();
        SUBMISSION_LATENCY_MS
            .with_label_values(&[op])
            .observe(latency_ms);
    }

    pub fn build_refused(kind: &str) {
        BUILDS_REFUSED_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn price_poll(ok: bool) {
        PRICE_POLLS_TOTAL
            .with_label_values(&[result_label(ok)])
            .inc();
    }

    pub fn inventory_refresh(ok: bool) {
        INVENTORY_REFRESH_TOTAL
            .with_label_values(&[result_label(ok)])
            .inc();
    }

    /// Render the default registry in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buf)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
