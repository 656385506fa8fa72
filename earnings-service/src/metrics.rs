use std::net::SocketAddr;

use axum::{routing::get, Router};
use once_cell::sync::Lazy;
use prometheus::{
    gather, register_gauge_vec, register_int_counter_vec, register_int_gauge, Encoder, GaugeVec,
    IntCounterVec, IntGauge, TextEncoder,
};

pub static POOL_EVALUATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "pool_evaluations_total",
        "Pool earnings evaluations by outcome",
        &["outcome"]
    )
    .unwrap()
});

pub static SOURCE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "source_failures_total",
        "Failed ledger or price lookups",
        &["source"]
    )
    .unwrap()
});

pub static POOL_APY: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "pool_apy_percent",
        "Latest reward APY per pool in percent",
        &["pool"]
    )
    .unwrap()
});

pub static LAST_EVALUATION_TIMESTAMP: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "last_evaluation_timestamp",
        "Evaluation instant (ms) of the latest pool run"
    )
    .unwrap()
});

async fn metrics_handler() -> impl axum::response::IntoResponse {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = gather();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "metrics encoding failed");
    }

    (
        [(
            axum::http::header::CONTENT_TYPE,
            encoder.format_type().to_string(),
        )],
        buffer,
    )
}

async fn health_handler() -> &'static str {
    "ok"
}

pub async fn serve(addr: SocketAddr) {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler));

    tracing::info!(%addr, "serving metrics");
    if let Err(e) = axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
    {
        tracing::error!(error = %e, "metrics server error");
    }
}
