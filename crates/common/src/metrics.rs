use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};

// Prometheus metrics (default registry)
pub static NEARBY_QUERIES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "toko_nearby_queries_total",
        "Total nearby store queries served"
    )
    .expect("register nearby_queries_total")
});

pub static NEARBY_QUERY_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "toko_nearby_query_duration_seconds",
        "Nearby query duration in seconds",
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
    )
    .expect("register nearby_query_duration")
});

pub static MUTATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "toko_mutations_total",
        "Committed store collection mutations by operation",
        &["op"]
    )
    .expect("register mutations_total")
});

pub static PERSISTENCE_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "toko_persistence_failures_total",
        "Backing document saves that failed and were rolled back"
    )
    .expect("register persistence_failures_total")
});

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_metrics_include_registered_families() {
        NEARBY_QUERIES_TOTAL.inc();
        MUTATIONS_TOTAL.with_label_values(&["append"]).inc();
        let (status, body) = encode_metrics();
        assert_eq!(status, axum::http::StatusCode::OK);
        assert!(body.contains("toko_nearby_queries_total"));
        assert!(body.contains("toko_mutations_total{op=\"append\"}"));
    }
}
