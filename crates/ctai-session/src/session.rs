//! Session data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix marking a token that no backend has ever verified
pub const LOCAL_TOKEN_PREFIX: &str = "local:";

/// `auth_provider` value for synthesized users
pub const LOCAL_PROVIDER: &str = "local";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub auth_provider: Option<String>,
}

impl User {
    /// Name to show in the header: the user's name, else their email
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// Token issued by the backend
    Verified,
    /// Pseudo-session synthesized on this machine
    Local,
}

impl SessionKind {
    pub fn of_token(token: &str) -> Self {
        if token.starts_with(LOCAL_TOKEN_PREFIX) {
            SessionKind::Local
        } else {
            SessionKind::Verified
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Verified => "verified",
            SessionKind::Local => "local",
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
    /// Only known right after a backend exchange; never persisted
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(token: String, user: User, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token,
            user,
            expires_at,
        }
    }

    /// Synthesize a pseudo-session for an already normalized email.
    ///
    /// The user's name is the trimmed `name` if given, else the local part
    /// of the email, else "User".
    pub fn local(email: &str, name: Option<&str>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_name_for(email));

        Self {
            token: format!("{LOCAL_TOKEN_PREFIX}{email}"),
            user: User {
                email: email.to_string(),
                name: Some(name),
                auth_provider: Some(LOCAL_PROVIDER.to_string()),
            },
            expires_at: None,
        }
    }

    pub fn kind(&self) -> SessionKind {
        SessionKind::of_token(&self.token)
    }

    pub fn is_local(&self) -> bool {
        self.kind() == SessionKind::Local
    }
}

/// Local part of an email, or "User" when there is none
pub fn default_name_for(email: &str) -> String {
    email
        .split('@')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("User")
        .to_string()
}

/// Authentication state as seen by the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// Startup resume has not finished yet
    Checking,
    Unauthenticated,
    Authenticated(Session),
}

impl AuthStatus {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthStatus::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Authenticated(_))
    }
}
