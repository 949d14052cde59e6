//! ClearTaxers-Ai Core
//!
//! Central coordination layer: configuration, logging, and the
//! application container the UI talks to.

mod app;
mod config;
mod error;

pub use app::App;
pub use config::Config;
pub use error::CoreError;

// Re-export core components
pub use ctai_auth::{
    ApiError, AuthApi, AuthError, AuthGateway, AuthMode, AuthResponse, Credentials,
    ExternalIdentity, FallbackPolicy, HttpAuthApi,
};
pub use ctai_session::{AuthStatus, Session, SessionError, SessionKind, SessionStore, User};
pub use ctai_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
