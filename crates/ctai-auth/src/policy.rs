//! Fallback policy and external identity capability

use serde::{Deserialize, Serialize};

/// Which degraded paths the gateway may take instead of failing.
///
/// Both are off by default. Demo deployments turn them on so the UI keeps
/// working without a reachable backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackPolicy {
    /// Synthesize a local pseudo-session when the backend can't vouch for one
    pub local_sessions: bool,
    /// On a 401 during login, try register-then-login once
    pub auto_register: bool,
}

impl FallbackPolicy {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn demo() -> Self {
        Self {
            local_sessions: true,
            auto_register: true,
        }
    }
}

/// A configured third-party identity provider (e.g. Google Identity).
///
/// The gateway only exchanges credentials this provider issued; obtaining
/// them is the front-end's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    pub provider: String,
    pub client_id: String,
}

impl ExternalIdentity {
    pub fn google(client_id: impl Into<String>) -> Self {
        Self {
            provider: "google".to_string(),
            client_id: client_id.into(),
        }
    }

    /// Present only when a non-blank client id is configured
    pub fn google_from_client_id(client_id: Option<&str>) -> Option<Self> {
        client_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(Self::google)
    }
}
