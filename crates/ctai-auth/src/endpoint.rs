//! Backend base URL resolution

use url::Url;

/// Port the front-end dev server listens on
pub const DEV_FRONTEND_PORT: u16 = 3000;
/// Port the backend dev server listens on
pub const DEV_BACKEND_PORT: u16 = 8000;

/// Resolve the backend base URL.
///
/// Order: explicit override, else the page origin with the dev front-end
/// port swapped for the dev backend port, else `None` (no backend).
/// Blank or unparseable values count as unset.
pub fn resolve_backend_base(
    override_url: Option<&str>,
    page_origin: Option<&str>,
) -> Option<Url> {
    if let Some(raw) = override_url.map(str::trim).filter(|s| !s.is_empty()) {
        match Url::parse(raw) {
            Ok(url) => return Some(url),
            Err(e) => tracing::warn!(url = %raw, error = %e, "Ignoring invalid backend URL"),
        }
    }

    let raw = page_origin.map(str::trim).filter(|s| !s.is_empty())?;
    let mut origin = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(url = %raw, error = %e, "Ignoring invalid page origin");
            return None;
        }
    };

    if origin.port() != Some(DEV_FRONTEND_PORT) {
        return None;
    }

    origin.set_port(Some(DEV_BACKEND_PORT)).ok()?;
    Url::parse(&origin.origin().ascii_serialization()).ok()
}
