//! Gateway error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("No backend configured")]
    NoBackend,

    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Backend refused the request; the message is shown to the user as is
    #[error("{0}")]
    Rejected(String),

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("External sign-in is not configured")]
    ExternalProviderUnavailable,

    #[error("Session error: {0}")]
    Session(#[from] ctai_session::SessionError),
}
