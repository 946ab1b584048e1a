//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::error::AppError;
use axum::{extract::State, http::StatusCode};
use std::sync::Arc;
use sweet_shop_core::Catalog;

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check the store.
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness check: 200 when the catalog store answers a ping.
///
/// # Errors
///
/// 503 Service Unavailable when the store is unreachable.
pub async fn readiness(
    State(catalog): State<Arc<Catalog>>,
) -> Result<(StatusCode, &'static str), AppError> {
    match catalog.ping().await {
        Ok(()) => Ok((StatusCode::OK, "ready")),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            Err(AppError::unavailable("store unreachable"))
        }
    }
}
