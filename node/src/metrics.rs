//! # Prometheus Metrics
//!
//! Operational metrics for the ledger node, scraped at `/metrics` on the
//! metrics port. Everything lives in a dedicated [`prometheus::Registry`]
//! under the `assent` namespace.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::core::Collector;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Metric handles for the node. Cloning shares the underlying metrics.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Successful mints, labelled by consent path (`eoa` or `contract`).
    pub mints_total: IntCounterVec,
    /// Successful burns (single and batch).
    pub burns_total: IntCounter,
    /// Ledger requests that failed, labelled by error kind.
    pub rejected_requests_total: IntCounterVec,
    /// JSON-RPC calls, labelled by method.
    pub rpc_requests_total: IntCounterVec,
    /// Wall-clock time spent handling one JSON-RPC call.
    pub rpc_latency_seconds: Histogram,
    /// Currently connected WebSocket subscribers.
    pub ws_subscribers: IntGauge,
}

fn register<C>(registry: &Registry, collector: C) -> Result<C, prometheus::Error>
where
    C: Collector + Clone + 'static,
{
    registry.register(Box::new(collector.clone()))?;
    Ok(collector)
}

impl NodeMetrics {
    /// Creates and registers every metric. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("assent".into()), None)?;

        let mints_total = register(
            &registry,
            IntCounterVec::new(
                Opts::new("mints_total", "Successful mint requests by consent path"),
                &["path"],
            )?,
        )?;
        let burns_total = register(
            &registry,
            IntCounter::new("burns_total", "Successful burn requests")?,
        )?;
        let rejected_requests_total = register(
            &registry,
            IntCounterVec::new(
                Opts::new(
                    "rejected_requests_total",
                    "Ledger requests rejected, by error kind",
                ),
                &["kind"],
            )?,
        )?;
        let rpc_requests_total = register(
            &registry,
            IntCounterVec::new(
                Opts::new("rpc_requests_total", "JSON-RPC calls by method"),
                &["method"],
            )?,
        )?;
        let rpc_latency_seconds = register(
            &registry,
            Histogram::with_opts(
                HistogramOpts::new(
                    "rpc_latency_seconds",
                    "JSON-RPC call handling latency in seconds",
                )
                .buckets(vec![
                    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25,
                ]),
            )?,
        )?;
        let ws_subscribers = register(
            &registry,
            IntGauge::new("ws_subscribers", "Connected WebSocket event subscribers")?,
        )?;

        Ok(Self {
            registry,
            mints_total,
            burns_total,
            rejected_requests_total,
            rpc_requests_total,
            rpc_latency_seconds,
            ws_subscribers,
        })
    }

    /// Encodes all registered metrics into the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Renders `/metrics` in Prometheus text format, or 500 if encoding fails.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
