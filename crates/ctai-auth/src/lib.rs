//! ClearTaxers-Ai Auth Gateway
//!
//! Decides whether the user is authenticated for UI purposes by
//! reconciling three sources:
//! 1. A session remembered in local storage
//! 2. A session validated against the backend (`/auth/*`)
//! 3. A local pseudo-session when no backend can be reached
//!
//! Pseudo-sessions and automatic registration are opt-in through
//! [`FallbackPolicy`].

mod api;
mod endpoint;
mod error;
mod gateway;
mod http;
mod policy;

pub use api::{ApiError, AuthApi, AuthResponse};
pub use endpoint::{resolve_backend_base, DEV_BACKEND_PORT, DEV_FRONTEND_PORT};
pub use error::AuthError;
pub use gateway::{AuthGateway, AuthMode, Credentials};
pub use http::HttpAuthApi;
pub use policy::{ExternalIdentity, FallbackPolicy};

pub type Result<T> = std::result::Result<T, AuthError>;
