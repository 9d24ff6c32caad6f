//! REST client for the Budgetbook sync backend.

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;

use budgetbook_core::conflict::ProfileSnapshot;
use budgetbook_core::sync::SyncEntityKind;

use crate::error::{Result, SyncClientError};
use crate::session::SessionContext;
use crate::types::{
    extract_remote_id, parse_login_response, parse_refresh_response, AllocationPayload,
    ApiErrorResponse, AuthSession, ExpensePayload, IncomePayload, LoginRequest, RefreshRequest,
};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Client for the Budgetbook sync backend.
///
/// All entity calls are authenticated with the bearer token held by the
/// injected [`SessionContext`]. On a 401 the client refreshes the token
/// once and replays the original request once; a second 401 is terminal
/// until the user logs in again.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the backend (e.g., "https://api.budgetbook.app")
    /// * `session` - The durable session holding the auth tokens
    pub fn new(base_url: &str, session: SessionContext) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    /// Create headers for an authenticated API request.
    fn headers(&self, token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| SyncClientError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    /// Parse a JSON response body. Empty 2xx bodies (delete endpoints)
    /// come back as `Value::Null`.
    async fn parse_response(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            // Try to parse error response
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(SyncClientError::api(
                    status.as_u16(),
                    format!("{}: {}", error.code, error.message),
                ));
            }
            return Err(SyncClientError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| {
            log::error!(
                "Failed to deserialize response. Body: {}, Error: {}",
                body,
                e
            );
            SyncClientError::api(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: &str,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .request(method, &url)
            .headers(self.headers(token)?);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Send an authenticated request, with a single refresh-and-replay on 401.
    async fn authed_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let token = self
            .session
            .access_token()?
            .ok_or_else(|| SyncClientError::auth("no active session"))?;

        let response = self.execute(method.clone(), path, body, &token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::parse_response(response).await;
        }

        debug!("401 on {} {}, refreshing access token", method, path);
        let token = self.refresh_session().await?;
        let retried = self.execute(method, path, body, &token).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            return Err(SyncClientError::auth(
                "access token rejected after refresh; re-login required",
            ));
        }
        Self::parse_response(retried).await
    }

    /// Exchange the stored refresh token for a new access token and persist
    /// the rotated pair.
    async fn refresh_session(&self) -> Result<String> {
        let refresh_token = self
            .session
            .refresh_token()?
            .ok_or_else(|| SyncClientError::auth("no refresh token stored"))?;

        let url = format!("{}/auth/refresh", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;
        let body: Value = Self::parse_response(response).await?;
        let (access_token, rotated_refresh) = parse_refresh_response(&body)?;
        self.session
            .update_tokens(access_token.clone(), rotated_refresh)?;
        Ok(access_token)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Auth
    // ─────────────────────────────────────────────────────────────────────

    /// Log in and persist the normalized session.
    ///
    /// POST /auth/login
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let url = format!("{}/auth/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        let body: Value = Self::parse_response(response).await?;
        let session = parse_login_response(&body)?;
        self.session.save(&session)?;
        Ok(session)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expenses
    // ─────────────────────────────────────────────────────────────────────

    /// POST /expenses — returns the remote document id.
    pub async fn create_expense(&self, payload: &ExpensePayload) -> Result<String> {
        let body = serde_json::to_value(payload)?;
        let response = self
            .authed_request(Method::POST, "/expenses", Some(&body))
            .await?;
        extract_remote_id(SyncEntityKind::Expense, &response)
    }

    /// PUT /expenses/{id}
    pub async fn update_expense(&self, remote_id: &str, payload: &ExpensePayload) -> Result<()> {
        let body = serde_json::to_value(payload)?;
        self.authed_request(
            Method::PUT,
            &format!("/expenses/{}", remote_id),
            Some(&body),
        )
        .await?;
        Ok(())
    }

    /// DELETE /expenses/{id}
    pub async fn delete_expense(&self, remote_id: &str) -> Result<()> {
        self.authed_request(Method::DELETE, &format!("/expenses/{}", remote_id), None)
            .await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Income
    // ─────────────────────────────────────────────────────────────────────

    /// POST /income — returns the remote document id.
    pub async fn create_income(&self, payload: &IncomePayload) -> Result<String> {
        let body = serde_json::to_value(payload)?;
        let response = self
            .authed_request(Method::POST, "/income", Some(&body))
            .await?;
        extract_remote_id(SyncEntityKind::Income, &response)
    }

    /// PUT /income/{id}
    pub async fn update_income(&self, remote_id: &str, payload: &IncomePayload) -> Result<()> {
        let body = serde_json::to_value(payload)?;
        self.authed_request(Method::PUT, &format!("/income/{}", remote_id), Some(&body))
            .await?;
        Ok(())
    }

    /// DELETE /income/{id}
    pub async fn delete_income(&self, remote_id: &str) -> Result<()> {
        self.authed_request(Method::DELETE, &format!("/income/{}", remote_id), None)
            .await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Allocations
    // ─────────────────────────────────────────────────────────────────────

    /// POST /allocations — returns the remote document id.
    pub async fn create_allocation(&self, payload: &AllocationPayload) -> Result<String> {
        let body = serde_json::to_value(payload)?;
        let response = self
            .authed_request(Method::POST, "/allocations", Some(&body))
            .await?;
        extract_remote_id(SyncEntityKind::Allocation, &response)
    }

    /// PUT /allocations/{id}
    pub async fn update_allocation(
        &self,
        remote_id: &str,
        payload: &AllocationPayload,
    ) -> Result<()> {
        let body = serde_json::to_value(payload)?;
        self.authed_request(
            Method::PUT,
            &format!("/allocations/{}", remote_id),
            Some(&body),
        )
        .await?;
        Ok(())
    }

    /// DELETE /allocations/{id}
    pub async fn delete_allocation(&self, remote_id: &str) -> Result<()> {
        self.authed_request(Method::DELETE, &format!("/allocations/{}", remote_id), None)
            .await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Profile
    // ─────────────────────────────────────────────────────────────────────

    /// GET /profile
    pub async fn get_profile(&self) -> Result<ProfileSnapshot> {
        let body = self.authed_request(Method::GET, "/profile", None).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// PUT /profile
    pub async fn update_profile(&self, profile: &ProfileSnapshot) -> Result<()> {
        let body = serde_json::to_value(profile)?;
        self.authed_request(Method::PUT, "/profile", Some(&body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetbook_core::expenses::ExpenseStatus;
    use budgetbook_core::secrets::MemorySecretStore;
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex as TokioMutex;

    #[derive(Debug, Clone)]
    struct CapturedRequest {
        method: String,
        path: String,
        authorization: Option<String>,
    }

    #[derive(Debug, Clone)]
    struct MockResponse {
        status: u16,
        body: String,
    }

    fn api_error_body(code: &str, message: &str) -> String {
        format!(
            r#"{{"error":"error","code":"{}","message":"{}"}}"#,
            code, message
        )
    }

    fn header_end_offset(buffer: &[u8]) -> Option<usize> {
        buffer.windows(4).position(|window| window == b"\r\n\r\n")
    }

    async fn read_http_request(
        stream: &mut tokio::net::TcpStream,
    ) -> Option<(String, HashMap<String, String>)> {
        let mut buffer = Vec::new();
        loop {
            let mut chunk = [0_u8; 2048];
            let read = stream.read(&mut chunk).await.ok()?;
            if read == 0 {
                return None;
            }
            buffer.extend_from_slice(&chunk[..read]);
            if header_end_offset(&buffer).is_some() {
                break;
            }
        }

        let header_end = header_end_offset(&buffer)?;
        let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
        let mut lines = head.lines();
        let request_line = lines.next()?.to_string();

        let mut headers = HashMap::new();
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }

        let content_length = headers
            .get("content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);

        let mut body_read = buffer.len().saturating_sub(header_end + 4);
        while body_read < content_length {
            let mut chunk = [0_u8; 2048];
            let read = stream.read(&mut chunk).await.ok()?;
            if read == 0 {
                break;
            }
            body_read = body_read.saturating_add(read);
        }

        Some((request_line, headers))
    }

    fn status_text(status: u16) -> &'static str {
        match status {
            200 => "OK",
            201 => "Created",
            401 => "Unauthorized",
            422 => "Unprocessable Entity",
            500 => "Internal Server Error",
            _ => "Error",
        }
    }

    async fn write_http_response(
        stream: &mut tokio::net::TcpStream,
        status: u16,
        body: &str,
    ) -> std::io::Result<()> {
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            status_text(status),
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await?;
        stream.flush().await
    }

    async fn start_mock_server(
        responses: Vec<MockResponse>,
    ) -> (
        String,
        Arc<TokioMutex<Vec<CapturedRequest>>>,
        tokio::task::JoinHandle<()>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let captured = Arc::new(TokioMutex::new(Vec::<CapturedRequest>::new()));
        let scripted = Arc::new(TokioMutex::new(VecDeque::from(responses)));
        let captured_clone = Arc::clone(&captured);
        let scripted_clone = Arc::clone(&scripted);

        let handle = tokio::spawn(async move {
            loop {
                let (mut stream, _) = match listener.accept().await {
                    Ok(value) => value,
                    Err(_) => break,
                };

                let Some((request_line, headers)) = read_http_request(&mut stream).await else {
                    continue;
                };
                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or_default().to_string();
                let path = parts.next().unwrap_or_default().to_string();
                captured_clone.lock().await.push(CapturedRequest {
                    method,
                    path,
                    authorization: headers.get("authorization").cloned(),
                });

                let response = scripted_clone.lock().await.pop_front().unwrap_or(MockResponse {
                    status: 500,
                    body: api_error_body("INTERNAL", "unexpected request"),
                });
                let _ = write_http_response(&mut stream, response.status, &response.body).await;
            }
        });

        (format!("http://{}", addr), captured, handle)
    }

    fn client_with_session(base_url: &str) -> ApiClient {
        let session = SessionContext::new(Arc::new(MemorySecretStore::default()));
        session
            .save(&AuthSession {
                access_token: "acc-1".to_string(),
                refresh_token: Some("ref-1".to_string()),
                user: json!({"email": "a@b.co"}),
            })
            .expect("seed session");
        ApiClient::new(base_url, session)
    }

    fn rent_payload() -> ExpensePayload {
        ExpensePayload {
            title: "Rent".to_string(),
            amount: 1200.0,
            description: None,
            due_date: Some("2026-09-01".to_string()),
            status: ExpenseStatus::Pending,
            category: "Housing".to_string(),
        }
    }

    #[tokio::test]
    async fn create_expense_sends_bearer_token_and_returns_remote_id() {
        let (base_url, captured, server) = start_mock_server(vec![MockResponse {
            status: 201,
            body: r#"{"id":"e-9"}"#.to_string(),
        }])
        .await;
        let client = client_with_session(&base_url);

        let remote_id = client.create_expense(&rent_payload()).await.expect("create");
        assert_eq!(remote_id, "e-9");

        let requests = captured.lock().await.clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/expenses");
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer acc-1"));
        server.abort();
    }

    #[tokio::test]
    async fn a_401_triggers_one_refresh_and_one_replay() {
        let (base_url, captured, server) = start_mock_server(vec![
            MockResponse {
                status: 401,
                body: api_error_body("TOKEN_EXPIRED", "access token expired"),
            },
            MockResponse {
                status: 200,
                body: r#"{"token":"acc-2"}"#.to_string(),
            },
            MockResponse {
                status: 201,
                body: r#"{"expense":{"_id":"e-1"}}"#.to_string(),
            },
        ])
        .await;
        let client = client_with_session(&base_url);

        let remote_id = client.create_expense(&rent_payload()).await.expect("create");
        assert_eq!(remote_id, "e-1");

        let requests = captured.lock().await.clone();
        let paths = requests.iter().map(|r| r.path.as_str()).collect::<Vec<_>>();
        assert_eq!(paths, vec!["/expenses", "/auth/refresh", "/expenses"]);
        assert_eq!(requests[2].authorization.as_deref(), Some("Bearer acc-2"));

        // the rotated token is persisted for the next call
        assert_eq!(
            client.session().access_token().expect("token"),
            Some("acc-2".to_string())
        );
        server.abort();
    }

    #[tokio::test]
    async fn a_second_401_after_refresh_is_a_terminal_auth_error() {
        let (base_url, captured, server) = start_mock_server(vec![
            MockResponse {
                status: 401,
                body: api_error_body("TOKEN_EXPIRED", "access token expired"),
            },
            MockResponse {
                status: 200,
                body: r#"{"token":"acc-2"}"#.to_string(),
            },
            MockResponse {
                status: 401,
                body: api_error_body("TOKEN_REVOKED", "session revoked"),
            },
        ])
        .await;
        let client = client_with_session(&base_url);

        let err = client
            .create_expense(&rent_payload())
            .await
            .expect_err("revoked session");
        assert!(matches!(err, SyncClientError::Auth(_)));
        assert_eq!(
            err.retry_class(),
            crate::error::ApiRetryClass::ReauthRequired
        );
        assert_eq!(captured.lock().await.len(), 3);
        server.abort();
    }

    #[tokio::test]
    async fn api_error_bodies_surface_code_and_message() {
        let (base_url, _captured, server) = start_mock_server(vec![MockResponse {
            status: 422,
            body: api_error_body("VALIDATION", "amount is required"),
        }])
        .await;
        let client = client_with_session(&base_url);

        let err = client
            .create_expense(&rent_payload())
            .await
            .expect_err("validation failure");
        match err {
            SyncClientError::Api { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "VALIDATION: amount is required");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
        server.abort();
    }

    #[tokio::test]
    async fn login_persists_the_normalized_session() {
        let (base_url, captured, server) = start_mock_server(vec![MockResponse {
            status: 200,
            body: json!({
                "success": true,
                "data": {
                    "user": {"email": "a@b.co"},
                    "tokens": {"accessToken": "acc-new", "refreshToken": "ref-new"}
                }
            })
            .to_string(),
        }])
        .await;

        let session = SessionContext::new(Arc::new(MemorySecretStore::default()));
        let client = ApiClient::new(&base_url, session);

        let logged_in = client.login("a@b.co", "hunter22A").await.expect("login");
        assert_eq!(logged_in.access_token, "acc-new");

        let requests = captured.lock().await.clone();
        assert_eq!(requests[0].path, "/auth/login");
        // login itself is unauthenticated
        assert_eq!(requests[0].authorization, None);

        let stored = client.session().load().expect("load").expect("present");
        assert_eq!(stored.refresh_token.as_deref(), Some("ref-new"));
        server.abort();
    }
}
