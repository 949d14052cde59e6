//! CLI commands
//!
//! Each command maps one user action onto the [`App`] and returns a
//! serializable result the front-end renders.

use serde::Serialize;

use ctai_core::{App, AuthStatus, Credentials, Session};

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub email: String,
    pub name: Option<String>,
    pub auth_provider: Option<String>,
    pub kind: String,
    pub expires_at: Option<String>,
}

impl From<Session> for SessionInfo {
    fn from(session: Session) -> Self {
        let kind = session.kind().as_str().to_string();
        let expires_at = session.expires_at.map(|dt| dt.to_rfc3339());
        Self {
            email: session.user.email,
            name: session.user.name,
            auth_provider: session.user.auth_provider,
            kind,
            expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusInfo {
    pub state: String,
    pub greeting: Option<String>,
    pub session: Option<SessionInfo>,
    pub backend: Option<String>,
    pub external_sign_in: bool,
}

impl StatusInfo {
    fn from_app(app: &App) -> Self {
        let status = app.status();
        let state = match &status {
            AuthStatus::Checking => "checking",
            AuthStatus::Unauthenticated => "unauthenticated",
            AuthStatus::Authenticated(_) => "authenticated",
        }
        .to_string();

        Self {
            state,
            greeting: app.greeting(),
            session: status.session().cloned().map(SessionInfo::from),
            backend: app.config().backend_url.as_ref().map(|u| u.to_string()),
            external_sign_in: app.external_sign_in_available(),
        }
    }

    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        match (&self.greeting, &self.session) {
            (Some(greeting), Some(session)) => {
                lines.push(greeting.clone());
                lines.push(format!("  email:    {}", session.email));
                lines.push(format!("  session:  {}", session.kind));
                if let Some(expires_at) = &session.expires_at {
                    lines.push(format!("  expires:  {}", expires_at));
                }
            }
            _ => lines.push(format!("Not signed in ({})", self.state)),
        }
        lines.push(format!(
            "  backend:  {}",
            self.backend.as_deref().unwrap_or("none")
        ));
        if !self.external_sign_in {
            lines.push("  Google sign-in is not configured.".to_string());
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct CommandResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

pub fn status(app: &App) -> CommandResult<StatusInfo> {
    CommandResult::ok(StatusInfo::from_app(app))
}

pub async fn login(app: &App, credentials: Credentials) -> CommandResult<StatusInfo> {
    match app.login(&credentials).await {
        Ok(_) => CommandResult::ok(StatusInfo::from_app(app)),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub async fn register(app: &App, credentials: Credentials) -> CommandResult<StatusInfo> {
    match app.register(&credentials).await {
        Ok(_) => CommandResult::ok(StatusInfo::from_app(app)),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub async fn google(app: &App, id_token: &str) -> CommandResult<StatusInfo> {
    match app.sign_in_with_external(id_token).await {
        Ok(_) => CommandResult::ok(StatusInfo::from_app(app)),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub fn logout(app: &App) -> CommandResult<StatusInfo> {
    match app.logout() {
        Ok(()) => CommandResult::ok(StatusInfo::from_app(app)),
        Err(e) => CommandResult::err(e.to_string()),
    }
}
