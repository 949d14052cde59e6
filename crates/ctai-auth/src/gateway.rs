//! Session bootstrap and auth gateway
//!
//! ```text
//! resume:        stored token ──► local token + stored user ──► resumed (no call)
//!                     │
//!                     └──► GET /auth/me ──► ok ──► resumed
//!                                  ├──► unreachable ──► stored user? ──► resumed (degraded)
//!                                  └──► rejected ──► cleared
//!
//! login:         POST /auth/login ──► ok ──► persisted
//!                        ├──► 401 ──► register, login again ──► ok / pseudo-session
//!                        ├──► unreachable ──► pseudo-session
//!                        └──► other ──► error surfaced
//! ```
//!
//! Pseudo-session and auto-register branches only run when the
//! [`FallbackPolicy`] allows them.

use std::sync::Arc;

use ctai_session::{default_name_for, Session, SessionKind, SessionStore, User};

use crate::api::{ApiError, AuthApi, AuthResponse};
use crate::error::AuthError;
use crate::policy::{ExternalIdentity, FallbackPolicy};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Login => "login",
            AuthMode::Register => "register",
        }
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the user typed into the sign-in form
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }

    fn entered_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }

    /// Name sent on registration: the entered name, else the email's local part
    fn registration_name(&self, email: &str) -> String {
        self.entered_name()
            .map(str::to_string)
            .unwrap_or_else(|| default_name_for(email))
    }
}

pub struct AuthGateway {
    store: SessionStore,
    /// `None` means no backend is configured
    backend: Option<Arc<dyn AuthApi>>,
    policy: FallbackPolicy,
    external: Option<ExternalIdentity>,
}

impl AuthGateway {
    pub fn new(
        store: SessionStore,
        backend: Option<Arc<dyn AuthApi>>,
        policy: FallbackPolicy,
    ) -> Self {
        Self {
            store,
            backend,
            policy,
            external: None,
        }
    }

    pub fn with_external_identity(mut self, external: Option<ExternalIdentity>) -> Self {
        self.external = external;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn external_identity(&self) -> Option<&ExternalIdentity> {
        self.external.as_ref()
    }

    /// Restore the remembered session, validating it with the backend when
    /// one is configured. Returns `None` when the user must sign in.
    pub async fn resume(&self) -> Result<Option<Session>> {
        self.store.mark_checking();

        let Some(token) = self.store.stored_token()? else {
            self.store.clear()?;
            tracing::info!("No stored session");
            return Ok(None);
        };
        let stored_user = self.store.stored_user()?;

        if SessionKind::of_token(&token) == SessionKind::Local {
            if let Some(user) = stored_user.clone() {
                if !self.policy.local_sessions {
                    tracing::info!("Discarding stored pseudo-session; local sessions disabled");
                    self.store.clear()?;
                    return Ok(None);
                }
                return self.resume_stored(token, user).map(Some);
            }
        }

        let Some(backend) = self.backend.as_ref() else {
            return self.resume_offline(token, stored_user, "no backend configured");
        };

        match backend.me(&token).await {
            Ok(user) => {
                let session = Session::new(token, user, None);
                self.store.persist(&session)?;
                tracing::info!(email = %session.user.email, "Resumed verified session");
                Ok(Some(session))
            }
            Err(ApiError::Unreachable(reason)) => {
                self.resume_offline(token, stored_user, &reason)
            }
            Err(e) => {
                tracing::info!(error = %e, "Stored token rejected; clearing session");
                self.store.clear()?;
                Ok(None)
            }
        }
    }

    fn resume_stored(&self, token: String, user: User) -> Result<Session> {
        let session = Session::new(token, user, None);
        self.store.persist(&session)?;
        tracing::info!(
            email = %session.user.email,
            kind = %session.kind(),
            "Resumed stored session without verification"
        );
        Ok(session)
    }

    fn resume_offline(
        &self,
        token: String,
        stored_user: Option<User>,
        reason: &str,
    ) -> Result<Option<Session>> {
        match stored_user {
            Some(user) if self.policy.local_sessions => {
                tracing::warn!(reason = %reason, "Backend unavailable; resuming stored session");
                self.resume_stored(token, user).map(Some)
            }
            _ => {
                tracing::info!(reason = %reason, "Cannot verify stored session; clearing");
                self.store.clear()?;
                Ok(None)
            }
        }
    }

    /// Sign in or register with email and password
    pub async fn authenticate(&self, mode: AuthMode, credentials: &Credentials) -> Result<Session> {
        let email = credentials.normalized_email();
        if email.is_empty() {
            return Err(AuthError::MissingField("Email"));
        }
        if credentials.password.is_empty() {
            return Err(AuthError::MissingField("Password"));
        }

        let Some(backend) = self.backend.clone() else {
            return self.local_or(&email, credentials, AuthError::NoBackend);
        };

        let result = match mode {
            AuthMode::Login => backend.login(&email, &credentials.password).await,
            AuthMode::Register => {
                let name = credentials.registration_name(&email);
                backend
                    .register(&email, &credentials.password, &name)
                    .await
            }
        };

        match result {
            Ok(response) => self.accept(response, mode.as_str()),
            Err(ApiError::Unreachable(reason)) => {
                tracing::warn!(mode = %mode, reason = %reason, "Backend unreachable");
                self.local_or(&email, credentials, AuthError::Unreachable(reason))
            }
            Err(e) if mode == AuthMode::Login && e.is_invalid_credentials() => {
                self.recover_login(backend.as_ref(), &email, credentials)
                    .await
            }
            Err(ApiError::Malformed(reason)) => Err(AuthError::MalformedResponse(reason)),
            Err(e) => {
                tracing::info!(mode = %mode, error = %e, "Backend rejected request");
                Err(AuthError::Rejected(e.message_or("Request failed")))
            }
        }
    }

    /// Register-then-login once after a 401, then fall back to a pseudo-session
    async fn recover_login(
        &self,
        backend: &dyn AuthApi,
        email: &str,
        credentials: &Credentials,
    ) -> Result<Session> {
        if !self.policy.auto_register {
            return self.local_or(email, credentials, AuthError::InvalidCredentials);
        }

        tracing::info!(email = %email, "Login rejected; trying register then login");

        let name = credentials.registration_name(email);
        if let Err(e) = backend.register(email, &credentials.password, &name).await {
            // "already exists" lands here too; the retry decides
            tracing::debug!(error = %e, "Auto-registration failed");
        }

        match backend.login(email, &credentials.password).await {
            Ok(response) => self.accept(response, "login-retry"),
            Err(ApiError::Unreachable(reason)) => {
                self.local_or(email, credentials, AuthError::Unreachable(reason))
            }
            Err(e) => {
                tracing::info!(error = %e, "Login retry rejected");
                self.local_or(email, credentials, AuthError::InvalidCredentials)
            }
        }
    }

    /// Exchange a third-party identity credential. No local fallback.
    pub async fn authenticate_with_external_credential(&self, id_token: &str) -> Result<Session> {
        let Some(external) = self.external.as_ref() else {
            return Err(AuthError::ExternalProviderUnavailable);
        };
        let id_token = id_token.trim();
        if id_token.is_empty() {
            return Err(AuthError::MissingField("ID token"));
        }
        let Some(backend) = self.backend.as_ref() else {
            return Err(AuthError::NoBackend);
        };

        match backend.google(id_token).await {
            Ok(response) => self.accept(response, &external.provider),
            Err(ApiError::Unreachable(reason)) => Err(AuthError::Unreachable(reason)),
            Err(ApiError::Malformed(reason)) => Err(AuthError::MalformedResponse(reason)),
            Err(e) => {
                tracing::info!(provider = %external.provider, error = %e, "External sign-in rejected");
                Err(AuthError::Rejected(e.message_or("Google sign-in failed")))
            }
        }
    }

    /// Forget the current session everywhere. Idempotent.
    pub fn logout(&self) -> Result<()> {
        let previous = self.store.current();
        self.store.clear()?;

        tracing::info!(
            email = previous.as_ref().map(|s| s.user.email.as_str()).unwrap_or("-"),
            "Logged out"
        );

        Ok(())
    }

    fn accept(&self, response: AuthResponse, via: &str) -> Result<Session> {
        let session: Session = response.into();
        self.store.persist(&session)?;
        tracing::info!(email = %session.user.email, via = %via, "Authenticated");
        Ok(session)
    }

    /// Pseudo-session when allowed, otherwise `err`
    fn local_or(&self, email: &str, credentials: &Credentials, err: AuthError) -> Result<Session> {
        if !self.policy.local_sessions {
            return Err(err);
        }

        let session = Session::local(email, credentials.entered_name());
        self.store.persist(&session)?;
        tracing::warn!(email = %email, cause = %err, "Signed in with local pseudo-session");
        Ok(session)
    }
}

impl Clone for AuthGateway {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            backend: self.backend.clone(),
            policy: self.policy,
            external: self.external.clone(),
        }
    }
}
