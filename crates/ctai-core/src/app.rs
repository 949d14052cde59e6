//! Main application state container
//!
//! Owns local storage, the session store and the auth gateway. UI layers
//! call into this and observe [`AuthStatus`] changes; they hold no session
//! state of their own.

use std::sync::Arc;
use tokio::sync::watch;

use ctai_auth::{AuthApi, AuthGateway, AuthMode, Credentials, HttpAuthApi};
use ctai_session::{AuthStatus, Session, SessionStore};
use ctai_storage::Database;

use crate::config::Config;
use crate::error::CoreError;
use crate::Result;

pub struct App {
    /// Configuration
    config: Config,
    /// Local storage
    db: Database,
    /// Session bootstrap and auth
    gateway: AuthGateway,
}

impl App {
    /// Open local storage and wire up the configured backend
    pub fn new(config: Config) -> Result<Self> {
        // Ensure data directory exists
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;

        let backend = match config.backend_url.clone() {
            Some(url) => {
                tracing::info!(backend = %url, "Using auth backend");
                let api = HttpAuthApi::new(url, config.request_timeout())
                    .map_err(|e| CoreError::Config(format!("HTTP client: {}", e)))?;
                Some(Arc::new(api) as Arc<dyn AuthApi>)
            }
            None => {
                tracing::info!("No auth backend configured");
                None
            }
        };

        Ok(Self::with_backend(config, db, backend))
    }

    /// Assemble from parts; lets embedders supply their own backend
    pub fn with_backend(
        config: Config,
        db: Database,
        backend: Option<Arc<dyn AuthApi>>,
    ) -> Self {
        let store = SessionStore::new(db.clone());
        let gateway = AuthGateway::new(store, backend, config.fallback)
            .with_external_identity(config.external_identity());

        Self {
            config,
            db,
            gateway,
        }
    }

    /// Page-load bootstrap: settle the session without user interaction
    pub async fn resume(&self) -> Result<AuthStatus> {
        self.gateway.resume().await?;
        Ok(self.status())
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        Ok(self
            .gateway
            .authenticate(AuthMode::Login, credentials)
            .await?)
    }

    pub async fn register(&self, credentials: &Credentials) -> Result<Session> {
        Ok(self
            .gateway
            .authenticate(AuthMode::Register, credentials)
            .await?)
    }

    pub async fn sign_in_with_external(&self, id_token: &str) -> Result<Session> {
        Ok(self
            .gateway
            .authenticate_with_external_credential(id_token)
            .await?)
    }

    pub fn logout(&self) -> Result<()> {
        Ok(self.gateway.logout()?)
    }

    pub fn status(&self) -> AuthStatus {
        self.gateway.store().status()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.gateway.store().subscribe()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.gateway.store().current()
    }

    /// Header greeting, e.g. "Hi, Asha"
    pub fn greeting(&self) -> Option<String> {
        self.current_session()
            .map(|session| format!("Hi, {}", session.user.display_name()))
    }

    pub fn external_sign_in_available(&self) -> bool {
        self.gateway.external_identity().is_some()
    }

    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl Clone for App {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            db: self.db.clone(),
            gateway: self.gateway.clone(),
        }
    }
}
