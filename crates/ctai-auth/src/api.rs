//! Backend API abstraction

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use ctai_session::{Session, User};

/// Success body shared by `/auth/login`, `/auth/register` and `/auth/google`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// RFC 3339 or naive ISO 8601 (read as UTC). Anything else is `None`
/// and never fails the surrounding response.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let Some(raw) = raw.filter(|v| !v.is_null()) else {
        return Ok(None);
    };

    let parsed = raw.as_str().and_then(|text| {
        DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    });

    if parsed.is_none() {
        tracing::warn!(value = %raw, "Ignoring unparseable expires_at");
    }

    Ok(parsed)
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Session::new(response.token, response.user, response.expires_at)
    }
}

/// Why a backend call did not produce a usable answer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never got an HTTP response (DNS, connect, timeout)
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// Non-2xx response. `detail` is the body's `detail` string, if any.
    #[error("HTTP {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected { status: u16, detail: Option<String> },

    /// The request could not be built (e.g. a token that is not a valid
    /// header value), or a 2xx body did not have the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::Unreachable(_))
    }

    /// Rejection the login recovery path treats as "wrong password"
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, ApiError::Rejected { status: 401, .. })
    }

    /// Backend-provided message, else `fallback`
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            ApiError::Rejected {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// The four auth endpoints of the backend
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `GET /auth/me` with the token as bearer credential
    async fn me(&self, token: &str) -> Result<User, ApiError>;

    /// `POST /auth/login`
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError>;

    /// `POST /auth/register`
    async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthResponse, ApiError>;

    /// `POST /auth/google`
    async fn google(&self, id_token: &str) -> Result<AuthResponse, ApiError>;
}
