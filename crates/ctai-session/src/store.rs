//! Session Store
//!
//! Owns the single "current session" slot and mirrors it to local storage.
//! Every transition writes (or removes) both storage keys in one
//! transaction before the memory slot changes.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

use ctai_storage::Database;

use crate::session::{AuthStatus, Session, User};
use crate::Result;

/// Storage key holding the raw token
pub const TOKEN_KEY: &str = "ctai_token";
/// Storage key holding the serialized user record
pub const USER_KEY: &str = "ctai_user";

pub struct SessionStore {
    /// Current session, if any
    current: Arc<RwLock<Option<Session>>>,
    /// Status broadcast to UI observers
    status: Arc<watch::Sender<AuthStatus>>,
    /// Persistent mirror
    db: Database,
}

impl SessionStore {
    pub fn new(db: Database) -> Self {
        let (status, _) = watch::channel(AuthStatus::Checking);

        Self {
            current: Arc::new(RwLock::new(None)),
            status: Arc::new(status),
            db,
        }
    }

    pub fn stored_token(&self) -> Result<Option<String>> {
        Ok(self
            .db
            .get_item(TOKEN_KEY)?
            .filter(|token| !token.is_empty()))
    }

    /// Stored user record. Unparseable records count as absent.
    pub fn stored_user(&self) -> Result<Option<User>> {
        let Some(raw) = self.db.get_item(USER_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed stored user record");
                Ok(None)
            }
        }
    }

    /// Persist a session and make it current
    pub fn persist(&self, session: &Session) -> Result<()> {
        let user_json = serde_json::to_string(&session.user)?;
        self.db.set_items(&[
            (TOKEN_KEY, session.token.as_str()),
            (USER_KEY, user_json.as_str()),
        ])?;

        *self.current.write() = Some(session.clone());
        self.status
            .send_replace(AuthStatus::Authenticated(session.clone()));

        tracing::debug!(
            email = %session.user.email,
            kind = %session.kind(),
            "Persisted session"
        );

        Ok(())
    }

    /// Drop the current session from memory and storage. Idempotent.
    pub fn clear(&self) -> Result<()> {
        self.db.remove_items(&[TOKEN_KEY, USER_KEY])?;

        *self.current.write() = None;
        self.status.send_replace(AuthStatus::Unauthenticated);

        Ok(())
    }

    /// Signal that a resume is in flight
    pub fn mark_checking(&self) {
        self.status.send_replace(AuthStatus::Checking);
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            status: Arc::clone(&self.status),
            db: self.db.clone(),
        }
    }
}
