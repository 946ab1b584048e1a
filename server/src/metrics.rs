//! Prometheus metrics exporter.
//!
//! Installs the global `metrics` recorder and serves the rendered registry
//! at `GET /metrics` on its own listener, away from the public API.

use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
    /// Failed to bind HTTP server
    #[error("Failed to bind metrics server: {0}")]
    Bind(#[from] std::io::Error),
}

/// Prometheus metrics server.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: PrometheusHandle,
}

impl MetricsServer {
    /// Install the recorder. Call once per process.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Build`] or [`MetricsError::Install`] if the
    /// exporter cannot be configured or a recorder is already installed.
    pub fn install(addr: SocketAddr) -> Result<Self, MetricsError> {
        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .install_recorder()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        // Descriptions only reach the recorder installed above
        register_metrics();

        Ok(Self { addr, handle })
    }

    /// Bind the listener and serve `/metrics` in the background.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Bind`] if the address is unavailable.
    pub async fn spawn(self) -> Result<JoinHandle<()>, MetricsError> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let handle = self.handle;
        let app = Router::new().route("/metrics", get(move || async move { handle.render() }));

        tracing::info!(
            addr = %self.addr,
            "Metrics server started - available at http://{}/metrics",
            self.addr
        );

        Ok(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Metrics server stopped");
            }
        }))
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(
        "sweets_purchases_total",
        "Purchase attempts by outcome (ok, rejected, error)"
    );
    describe_counter!("sweets_units_sold_total", "Units removed from stock by purchases");
    describe_counter!(
        "sweets_restocks_total",
        "Restock attempts by outcome (ok, not_found, error)"
    );
    describe_counter!(
        "sweets_searches_total",
        "Catalog searches by outcome (ok, rejected)"
    );
    describe_counter!("http_requests_total", "HTTP responses by status code");
    describe_histogram!(
        "http_request_duration_seconds",
        "Time from request arrival to response"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    // The only test in this binary that installs the global recorder.
    #[test]
    fn test_installed_exporter_renders_descriptions() {
        let server = MetricsServer::install("127.0.0.1:0".parse().unwrap()).unwrap();
        metrics::counter!("sweets_purchases_total", "outcome" => "ok").increment(1);

        let rendered = server.handle.render();
        assert!(
            rendered.contains("# HELP sweets_purchases_total Purchase attempts by outcome"),
            "{rendered}"
        );
        assert!(rendered.contains("sweets_purchases_total{outcome=\"ok\"} 1"), "{rendered}");
    }
}
