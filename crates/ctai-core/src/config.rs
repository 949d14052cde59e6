//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use ctai_auth::{resolve_backend_base, ExternalIdentity, FallbackPolicy};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the local storage database
    pub database_path: PathBuf,
    /// Auth backend base URL; `None` means run without a backend
    pub backend_url: Option<Url>,
    /// Google Identity client id; enables external sign-in when set
    pub google_client_id: Option<String>,
    /// Degraded paths allowed when the backend can't help
    pub fallback: FallbackPolicy,
    /// Per-request timeout for backend calls
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("ctai.db"),
            backend_url: None,
            google_client_id: None,
            fallback: FallbackPolicy::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn data_dir() -> PathBuf {
        platform_data_dir()
            .map(|d| d.join("ClearTaxers-Ai"))
            .unwrap_or_else(|| PathBuf::from(".ctai"))
    }

    /// Build from `CTAI_*` environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    ///
    /// - `CTAI_DATA_DIR`: directory holding the database
    /// - `CTAI_BACKEND_URL`: explicit backend base URL
    /// - `CTAI_PAGE_ORIGIN`: origin the front-end is served from (dev port inference)
    /// - `CTAI_GOOGLE_CLIENT_ID`: enables Google sign-in
    /// - `CTAI_DEMO_MODE`: allow pseudo-sessions and auto-registration
    /// - `CTAI_REQUEST_TIMEOUT_SECS`: backend request timeout
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = var("CTAI_DATA_DIR")
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(Self::data_dir);

        let mut config = Self::new(data_dir);

        config.backend_url = resolve_backend_base(
            var("CTAI_BACKEND_URL").as_deref(),
            var("CTAI_PAGE_ORIGIN").as_deref(),
        );

        config.google_client_id = var("CTAI_GOOGLE_CLIENT_ID")
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        if var("CTAI_DEMO_MODE").as_deref().is_some_and(is_truthy) {
            config.fallback = FallbackPolicy::demo();
        }

        if let Some(raw) = var("CTAI_REQUEST_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout_secs = secs,
                _ => tracing::warn!(value = %raw, "Ignoring invalid request timeout"),
            }
        }

        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn external_identity(&self) -> Option<ExternalIdentity> {
        ExternalIdentity::google_from_client_id(self.google_client_id.as_deref())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Per-user application data root, following each platform's convention
fn platform_data_dir() -> Option<PathBuf> {
    let env_dir = |key: &str| {
        std::env::var_os(key)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    };

    if cfg!(target_os = "windows") {
        env_dir("LOCALAPPDATA")
    } else if cfg!(target_os = "macos") {
        env_dir("HOME").map(|home| home.join("Library").join("Application Support"))
    } else {
        env_dir("XDG_DATA_HOME")
            .or_else(|| env_dir("HOME").map(|home| home.join(".local").join("share")))
    }
}
