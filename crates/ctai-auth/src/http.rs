//! reqwest-backed [`AuthApi`]

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use ctai_session::User;

use crate::api::{ApiError, AuthApi, AuthResponse};

#[derive(Clone)]
pub struct HttpAuthApi {
    client: Client,
    base: Url,
}

impl HttpAuthApi {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(classify_send_error)?;

        decode(response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, ApiError> {
        let request = self.client.post(self.endpoint(path)).json(&body);
        self.send(request).await
    }
}

/// Only failures to reach the backend count as unreachable; a request that
/// could not even be built is the caller's data at fault.
fn classify_send_error(e: reqwest::Error) -> ApiError {
    if e.is_builder() {
        ApiError::Malformed(e.to_string())
    } else if e.is_connect() || e.is_timeout() || e.is_request() {
        ApiError::Unreachable(e.to_string())
    } else {
        ApiError::Malformed(e.to_string())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();

    if !status.is_success() {
        // Error bodies are best effort; only a string `detail` is used
        let detail = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("detail").and_then(Value::as_str).map(str::to_string));

        return Err(ApiError::Rejected {
            status: status.as_u16(),
            detail,
        });
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            ApiError::Unreachable(e.to_string())
        } else {
            ApiError::Malformed(e.to_string())
        }
    })?;

    serde_json::from_slice(&bytes).map_err(|e| ApiError::Malformed(e.to_string()))
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn me(&self, token: &str) -> Result<User, ApiError> {
        let request = self.client.get(self.endpoint("/auth/me")).bearer_auth(token);
        self.send(request).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.post(
            "/auth/login",
            json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthResponse, ApiError> {
        self.post(
            "/auth/register",
            json!({ "email": email, "password": password, "name": name }),
        )
        .await
    }

    async fn google(&self, id_token: &str) -> Result<AuthResponse, ApiError> {
        self.post("/auth/google", json!({ "id_token": id_token }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve one canned HTTP response and hand back the raw request text
    async fn serve_once(status_line: &str, body: &str) -> (Url, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(request);
        });

        (Url::parse(&format!("http://{}", addr)).unwrap(), rx)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buf).into_owned()
    }

    fn api(base: Url) -> HttpAuthApi {
        HttpAuthApi::new(base, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_me_sends_bearer_token() {
        let (base, request) =
            serve_once("200 OK", r#"{"email":"kavya@example.com","name":"Kavya"}"#).await;

        let user = api(base).me("tok-abc").await.unwrap();
        assert_eq!(user.email, "kavya@example.com");

        let request = request.await.unwrap();
        assert!(request.starts_with("GET /auth/me "));
        assert!(request
            .to_lowercase()
            .contains("authorization: bearer tok-abc"));
    }

    #[tokio::test]
    async fn test_login_posts_json() {
        let (base, request) = serve_once(
            "200 OK",
            r#"{"token":"jwt","user":{"email":"a@b.c"},"expires_at":null}"#,
        )
        .await;

        let response = api(base).login("a@b.c", "hunter2").await.unwrap();
        assert_eq!(response.token, "jwt");

        let request = request.await.unwrap();
        assert!(request.starts_with("POST /auth/login "));
        assert!(request.contains(r#""email":"a@b.c""#));
        assert!(request.contains(r#""password":"hunter2""#));
    }

    #[tokio::test]
    async fn test_naive_expiry_keeps_session() {
        let (base, _) = serve_once(
            "200 OK",
            r#"{"token":"jwt","user":{"email":"a@b.c"},"expires_at":"2025-01-01T00:00:00.123456"}"#,
        )
        .await;

        let response = api(base).login("a@b.c", "pw").await.unwrap();
        assert_eq!(response.token, "jwt");
        assert_eq!(
            response.expires_at.map(|at| at.date_naive().to_string()).as_deref(),
            Some("2025-01-01")
        );
    }

    #[tokio::test]
    async fn test_rejection_carries_detail() {
        let (base, _) = serve_once(
            "401 Unauthorized",
            r#"{"detail":"Invalid email or password"}"#,
        )
        .await;

        let err = api(base).login("a@b.c", "nope").await.unwrap_err();
        assert!(err.is_invalid_credentials());
        assert_eq!(err.message_or("Request failed"), "Invalid email or password");
    }

    #[tokio::test]
    async fn test_non_string_detail_is_dropped() {
        let (base, _) = serve_once(
            "422 Unprocessable Entity",
            r#"{"detail":[{"loc":["body","email"],"msg":"field required"}]}"#,
        )
        .await;

        let err = api(base).register("a@b.c", "pw", "a").await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Rejected {
                status: 422,
                detail: None
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let (base, _) = serve_once("200 OK", r#"{"unexpected":true}"#).await;

        let err = api(base).google("id-token").await.unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_refused_connection_is_unreachable() {
        // Grab a free port, then close it so nothing is listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base = Url::parse(&format!("http://{}", addr)).unwrap();
        let err = api(base).login("a@b.c", "pw").await.unwrap_err();
        assert!(err.is_unreachable());
    }

    #[tokio::test]
    async fn test_unsendable_token_is_not_unreachable() {
        // Never contacted: the header value is refused before connecting
        let base = Url::parse("http://127.0.0.1:9").unwrap();
        let err = api(base).me("bad\ntoken").await.unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
        assert!(!err.is_unreachable());
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let api = api(Url::parse("http://localhost:8000/").unwrap());
        assert_eq!(api.endpoint("/auth/me"), "http://localhost:8000/auth/me");

        let prefixed = HttpAuthApi::new(
            Url::parse("https://example.com/api/").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            prefixed.endpoint("/auth/login"),
            "https://example.com/api/auth/login"
        );
    }
}
