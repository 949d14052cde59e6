//! ClearTaxers-Ai Session Management
//!
//! - At most one session is current at a time
//! - The in-memory slot and the persisted keys change together
//! - Sessions are local to one profile (no cross-device sync)

mod error;
mod session;
mod store;

pub use error::SessionError;
pub use session::{
    default_name_for, AuthStatus, Session, SessionKind, User, LOCAL_PROVIDER, LOCAL_TOKEN_PREFIX,
};
pub use store::{SessionStore, TOKEN_KEY, USER_KEY};

pub type Result<T> = std::result::Result<T, SessionError>;
