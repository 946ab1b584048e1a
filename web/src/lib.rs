//! Axum HTTP surface for the Sweet Shop backend.
//!
//! Handlers stay thin: they extract the caller, parse the path and body,
//! call into [`sweet_shop_core::Catalog`] or
//! [`sweet_shop_auth::IdentityService`], and map errors through [`AppError`].
//!
//! # Request Flow
//!
//! 1. **Track**: correlation ID, span, timing ([`middleware`])
//! 2. **Authenticate**: bearer token to identity ([`extractors::Caller`])
//! 3. **Dispatch** to the core operation
//! 4. **Map result** to JSON or `{ code, message }`
//!
//! # Example
//!
//! ```ignore
//! use sweet_shop_web::{router, AppState};
//!
//! let app = router(AppState::new(catalog, identity)).layer(cors_layer(None));
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::AppError;
pub use extractors::{AdminCaller, BearerToken, Caller};
pub use middleware::{request_tracking_layer, CorrelationIdExt, CORRELATION_ID_HEADER};
pub use router::{cors_layer, router};
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
