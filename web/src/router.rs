//! Route table.

use crate::handlers::{auth, health_check, readiness, sweets};
use crate::middleware::request_tracking_layer;
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::{Any, CorsLayer}};

/// Build the application router.
///
/// `/health` and `/ready` sit at the root, everything else under `/api`.
#[must_use]
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/sweets",
            get(sweets::list_sweets).post(sweets::create_sweet),
        )
        .route("/sweets/search", get(sweets::search_sweets))
        .route(
            "/sweets/:id",
            get(sweets::get_sweet)
                .put(sweets::update_sweet)
                .delete(sweets::delete_sweet),
        )
        .route("/sweets/:id/purchase", post(sweets::purchase_sweet))
        .route("/sweets/:id/restock", post(sweets::restock_sweet))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        .nest("/api", api)
        .layer(CompressionLayer::new())
        .layer(request_tracking_layer())
        .with_state(state)
}

/// CORS policy: a single allowed origin, or any origin when unset.
///
/// An origin that is not a valid header value falls back to any origin.
#[must_use]
pub fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match allowed_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(_)) => {
            tracing::warn!("Ignoring unparseable CORS origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}
