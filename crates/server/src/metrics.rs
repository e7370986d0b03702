use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static CART_READS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("cart_reads_total", "Total cart read requests")
        .expect("register cart_reads_total")
});

pub static CART_ITEMS_ADDED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("cart_items_added_total", "Total line items appended to carts")
        .expect("register cart_items_added_total")
});

pub static CART_WRITE_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("cart_write_failures_total", "Total cart appends that failed")
        .expect("register cart_write_failures_total")
});

pub static CART_LOCK_TIMEOUTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "cart_lock_timeouts_total",
        "Total appends rejected because the cart stayed locked"
    )
    .expect("register cart_lock_timeouts_total")
});

/// Force registration so every counter shows up at zero.
pub fn init() {
    Lazy::force(&CART_READS_TOTAL);
    Lazy::force(&CART_ITEMS_ADDED_TOTAL);
    Lazy::force(&CART_WRITE_FAILURES_TOTAL);
    Lazy::force(&CART_LOCK_TIMEOUTS_TOTAL);
}

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
