//! # Sweet Shop Auth
//!
//! Identity service for the Sweet Shop backend: registration, password
//! login, opaque bearer sessions and admin seeding.
//!
//! The catalog core never calls into this crate. The HTTP layer turns a
//! bearer token into a [`sweet_shop_core::Identity`] via
//! [`IdentityService::authenticate`] and passes that identity on.
//!
//! ## Flow
//!
//! ```text
//! POST /api/auth/register → IdentityService::register → UserStore::create
//! POST /api/auth/login    → IdentityService::login    → SessionRegistry::issue
//! Authorization: Bearer … → IdentityService::authenticate → Identity
//! ```

pub mod config;
pub mod error;
pub mod password;
pub mod providers;
pub mod service;
pub mod session;
pub mod stores;
pub mod user;
pub mod utils;

pub use config::AuthConfig;
pub use error::{AuthError, Result};
pub use providers::UserStore;
pub use service::IdentityService;
pub use stores::InMemoryUserStore;
pub use user::{AdminSeed, LoginRequest, LoginResponse, RegisterRequest, User, UserProfile};
