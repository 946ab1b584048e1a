//! Axum middleware for request tracking and observability.
//!
//! Every request gets a correlation ID: it is read from the `X-Correlation-ID`
//! header or generated, stored in request extensions, attached to the request
//! span and echoed back on the response. When the response is ready a single
//! log line records `METHOD path -> status (ms)`, and the
//! `http_requests_total` / `http_request_duration_seconds` metrics are updated.
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/api/sweets", get(list_sweets))
//!     .layer(request_tracking_layer());
//! ```

use axum::{extract::Request, http::HeaderValue, response::Response};
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Create a layer that tags, logs and times every request.
#[must_use]
pub const fn request_tracking_layer() -> RequestTrackingLayer {
    RequestTrackingLayer
}

/// Layer for request tracking.
#[derive(Clone, Debug)]
pub struct RequestTrackingLayer;

impl<S> Layer<S> for RequestTrackingLayer {
    type Service = RequestTrackingMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestTrackingMiddleware { inner }
    }
}

/// Middleware service for request tracking.
#[derive(Clone, Debug)]
pub struct RequestTrackingMiddleware<S> {
    inner: S,
}

impl<S> Service<Request> for RequestTrackingMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = req
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        req.extensions_mut().insert(correlation_id);

        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            method = %method,
            path = %path,
        );

        let started = Instant::now();
        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let mut response = fut.await?;

                let elapsed = started.elapsed();
                let status = response.status();
                tracing::info!(
                    "{method} {path} -> {} ({}ms)",
                    status.as_u16(),
                    elapsed.as_millis()
                );
                metrics::counter!("http_requests_total", "status" => status.as_u16().to_string())
                    .increment(1);
                metrics::histogram!("http_request_duration_seconds")
                    .record(elapsed.as_secs_f64());

                if let Ok(header_value) = HeaderValue::from_str(&correlation_id.to_string()) {
                    response
                        .headers_mut()
                        .insert(CORRELATION_ID_HEADER, header_value);
                }

                Ok(response)
            }
            .instrument(span),
        )
    }
}

/// Read the correlation ID the middleware stored on a request.
///
/// Returns `None` if the layer is not installed.
pub trait CorrelationIdExt {
    /// The request's correlation ID, if tagged.
    fn correlation_id(&self) -> Option<Uuid>;
}

impl<B> CorrelationIdExt for axum::http::Request<B> {
    fn correlation_id(&self) -> Option<Uuid> {
        self.extensions().get::<Uuid>().copied()
    }
}
