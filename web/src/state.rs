//! Application state for Axum handlers.

use axum::extract::FromRef;
use std::sync::Arc;
use sweet_shop_auth::IdentityService;
use sweet_shop_core::Catalog;

/// Application state shared across all HTTP handlers.
///
/// Handlers pull out the piece they need with `State<Arc<Catalog>>` or
/// `State<Arc<IdentityService>>`.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Catalog, inventory and search.
    pub catalog: Arc<Catalog>,
    /// Accounts and bearer sessions.
    pub identity: Arc<IdentityService>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub const fn new(catalog: Arc<Catalog>, identity: Arc<IdentityService>) -> Self {
        Self { catalog, identity }
    }
}

impl FromRef<AppState> for Arc<Catalog> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.catalog)
    }
}

impl FromRef<AppState> for Arc<IdentityService> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.identity)
    }
}
