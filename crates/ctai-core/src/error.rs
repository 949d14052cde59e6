//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] ctai_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] ctai_session::SessionError),

    #[error(transparent)]
    Auth(#[from] ctai_auth::AuthError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
