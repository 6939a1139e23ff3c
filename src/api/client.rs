//! reqwest-backed implementation of [`PortfolioApi`].

use crate::api::envelope::{self, ApiOutcome};
use crate::api::{ApiError, ApiResult, PortfolioApi};
use crate::models::{
    AccountInfo, Dividend, HealthStatus, Holdings, LoginRequest, Order, PortfolioSummary,
    StockAnalysis, UserInfo,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Connection settings for the backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// `None` leaves the transport's defaults in place.
    pub timeout_seconds: Option<u64>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_seconds: None,
            user_agent: format!("portfolio-analyzer/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client for the portfolio backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    timeout_seconds: Option<u64>,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client; the base URL must be an `http(s)://` URL.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::InvalidBaseUrl(config.base_url));
        }

        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.as_str());
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            base_url,
            timeout_seconds: config.timeout_seconds,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> ApiError {
        let message = match self.timeout_seconds {
            Some(secs) if e.is_timeout() => format!("timed out after {}s", secs),
            _ if e.is_connect() => format!("cannot connect to {}", self.base_url),
            _ => e.to_string(),
        };
        ApiError::Transport {
            url: url.to_string(),
            message,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> ApiResult<T> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        self.read(&url, response, fallback).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        fallback: &str,
    ) -> ApiResult<T> {
        let url = self.url(path);
        debug!("POST {}", url);

        let mut request = self.http.post(&url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        self.read(&url, response, fallback).await
    }

    async fn read<T: DeserializeOwned>(
        &self,
        url: &str,
        response: reqwest::Response,
        fallback: &str,
    ) -> ApiResult<T> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        debug!("{} -> HTTP {} ({} bytes)", url, status, body.len());

        envelope::decode(status, &body, fallback).map_err(|message| ApiError::Decode {
            url: url.to_string(),
            message,
        })
    }
}

#[async_trait]
impl PortfolioApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> ApiResult<()> {
        self.post("/api/auth/login", Some(request), "Login failed")
            .await
    }

    async fn logout(&self) -> ApiResult<()> {
        self.post::<(), ()>("/api/auth/logout", None, "Logout failed")
            .await
    }

    async fn clear_session(&self) -> ApiResult<()> {
        self.post::<(), ()>("/api/session/clear", None, "Failed to clear session")
            .await
    }

    async fn clear_cache(&self) -> ApiResult<()> {
        self.post::<(), ()>("/api/cache/clear", None, "Failed to clear cache")
            .await
    }

    async fn portfolio_summary(&self) -> ApiResult<PortfolioSummary> {
        self.get("/api/portfolio/summary", "Failed to load portfolio data")
            .await
    }

    async fn holdings(&self) -> ApiResult<Holdings> {
        self.get("/api/portfolio/holdings", "Failed to load holdings")
            .await
    }

    async fn dividends(&self) -> ApiResult<Vec<Dividend>> {
        self.get("/api/portfolio/dividends", "Failed to load dividends")
            .await
    }

    async fn all_orders(&self) -> ApiResult<Vec<Order>> {
        self.get("/api/orders/all", "Failed to load orders").await
    }

    async fn open_orders(&self) -> ApiResult<Vec<Order>> {
        self.get("/api/orders/open", "Failed to load open orders")
            .await
    }

    async fn account_info(&self) -> ApiResult<AccountInfo> {
        self.get("/api/account/info", "Failed to load account info")
            .await
    }

    async fn user_info(&self) -> ApiResult<UserInfo> {
        self.get("/api/user/info", "Failed to load user info").await
    }

    async fn stock_analysis(&self, symbol: &str) -> ApiResult<StockAnalysis> {
        let path = format!("/api/stock/{}", urlencoding::encode(symbol));
        self.get(&path, "Failed to load stock analysis").await
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = self.url("/api/health");
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        if !status.is_success() {
            return Err(ApiError::Decode {
                url,
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

/// Collapse a transport error into the outcome shown to the user.
pub fn outcome_or_message<T>(result: ApiResult<T>, message: &str) -> ApiOutcome<T> {
    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("{}", e);
            ApiOutcome::Failure(message.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::PortfolioData;
    use crate::models::LoginForm;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// A request as seen by the throwaway test server.
    #[derive(Debug, Clone)]
    struct Recorded {
        method: String,
        path: String,
        body: String,
    }

    /// Serve canned `(status, body)` replies keyed by path, one request per connection.
    async fn serve(
        routes: HashMap<&'static str, (u16, &'static str)>,
    ) -> (String, Arc<Mutex<Vec<Recorded>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&log);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                // Read headers, then as much body as Content-Length announces.
                let (head_end, content_length) = loop {
                    let n = socket.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        break (buf.len(), 0);
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                        let len = head
                            .lines()
                            .find_map(|l| l.strip_prefix("content-length:"))
                            .and_then(|v| v.trim().parse::<usize>().ok())
                            .unwrap_or(0);
                        break (pos + 4, len);
                    }
                };
                while buf.len() < head_end + content_length {
                    let n = socket.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }

                let text = String::from_utf8_lossy(&buf).to_string();
                let mut parts = text.split_whitespace();
                let method = parts.next().unwrap_or_default().to_string();
                let path = parts.next().unwrap_or_default().to_string();
                let body = text.get(head_end..).unwrap_or_default().to_string();
                seen.lock().unwrap().push(Recorded {
                    method,
                    path: path.clone(),
                    body,
                });

                let (status, reply) = routes
                    .get(path.as_str())
                    .copied()
                    .unwrap_or((404, r#"{"detail": "Not Found"}"#));
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reply.len(),
                    reply
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), log)
    }

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(ClientConfig {
            base_url: base_url.to_string(),
            ..ClientConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let result = ApiClient::new(ClientConfig {
            base_url: "localhost:8000".to_string(),
            ..ClientConfig::default()
        });
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let api = client("http://localhost:8000/");
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.url("/api/health"), "http://localhost:8000/api/health");
    }

    #[tokio::test]
    async fn test_login_posts_credentials() {
        let routes = HashMap::from([(
            "/api/auth/login",
            (200, r#"{"success": true, "message": "Login successful"}"#),
        )]);
        let (base, log) = serve(routes).await;
        let api = client(&base);

        let request = LoginRequest {
            username: "trader@example.com".to_string(),
            password: "secret1".to_string(),
            mfa_code: None,
        };
        let outcome = api.login(&request).await.unwrap();
        assert!(outcome.is_success());

        let recorded = log.lock().unwrap().clone();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].method, "POST");
        let body: serde_json::Value = serde_json::from_str(&recorded[0].body).unwrap();
        assert_eq!(body["username"], "trader@example.com");
        assert!(body.get("mfa_code").is_none());
    }

    #[tokio::test]
    async fn test_login_failure_message() {
        let routes = HashMap::from([(
            "/api/auth/login",
            (
                200,
                r#"{"success": false, "message": "Login failed. Please check your credentials."}"#,
            ),
        )]);
        let (base, _log) = serve(routes).await;
        let api = client(&base);

        let request = LoginForm::new("trader", "wrong-pass", "").to_request();
        let outcome = api.login(&request).await.unwrap();
        assert_eq!(
            outcome.failure_message(),
            Some("Login failed. Please check your credentials.")
        );
    }

    #[tokio::test]
    async fn test_summary_and_holdings_decode() {
        let routes = HashMap::from([
            (
                "/api/portfolio/summary",
                (
                    200,
                    r#"{"success": true, "data": {"total_equity": 1500.5, "total_market_value": 1490, "total_positions": 2, "total_dividends": 12.5}}"#,
                ),
            ),
            (
                "/api/portfolio/holdings",
                (
                    200,
                    r#"{"success": true, "data": {"AAPL": {"price": "190.00", "quantity": "5"}}}"#,
                ),
            ),
        ]);
        let (base, _log) = serve(routes).await;
        let api = client(&base);

        let summary = api.portfolio_summary().await.unwrap().ok().unwrap();
        assert_eq!(summary.total_positions, 2);
        assert_eq!(summary.total_dividends, 12.5);

        let holdings = api.holdings().await.unwrap().ok().unwrap();
        assert_eq!(holdings["AAPL"].price, 190.0);
        assert_eq!(holdings["AAPL"].quantity, 5.0);
    }

    #[tokio::test]
    async fn test_empty_sections_do_not_fail_the_batch() {
        let routes = HashMap::from([
            (
                "/api/portfolio/summary",
                (200, r#"{"success": true, "data": {"total_equity": 100}}"#),
            ),
            ("/api/portfolio/holdings", (200, r#"{"success": true, "data": {}}"#)),
            ("/api/portfolio/dividends", (200, r#"{"success": true, "data": null}"#)),
            ("/api/orders/all", (200, r#"{"success": true}"#)),
            ("/api/orders/open", (200, r#"{"success": true, "data": 42}"#)),
            ("/api/account/info", (200, r#"{"success": true, "data": {}}"#)),
            ("/api/user/info", (200, r#"{"success": true, "data": {}}"#)),
        ]);
        let (base, _log) = serve(routes).await;
        let api = client(&base);
        let mut data = PortfolioData::default();

        data.fetch_all(&api).await;

        assert!(data.error.is_none());
        assert_eq!(data.summary.as_ref().unwrap().total_equity, 100.0);
        assert_eq!(data.holdings.as_ref().map(|h| h.len()), Some(0));
        assert_eq!(data.dividends.as_ref().map(|d| d.len()), Some(0));
        assert_eq!(data.orders.as_ref().map(|o| o.len()), Some(0));
        assert!(data.open_orders.is_none());
        assert!(data.account.is_some());
    }

    #[tokio::test]
    async fn test_unauthenticated_detail_becomes_failure() {
        let routes = HashMap::from([(
            "/api/portfolio/summary",
            (401, r#"{"detail": "Not authenticated"}"#),
        )]);
        let (base, _log) = serve(routes).await;
        let api = client(&base);

        let outcome = api.portfolio_summary().await.unwrap();
        assert_eq!(outcome.failure_message(), Some("Not authenticated"));
    }

    #[tokio::test]
    async fn test_stock_analysis_path() {
        let routes = HashMap::from([(
            "/api/stock/BRK.B",
            (200, r#"{"success": true, "data": {"symbol": "BRK.B"}}"#),
        )]);
        let (base, log) = serve(routes).await;
        let api = client(&base);

        let analysis = api.stock_analysis("BRK.B").await.unwrap().ok().unwrap();
        assert_eq!(analysis.symbol, "BRK.B");
        assert_eq!(log.lock().unwrap()[0].path, "/api/stock/BRK.B");
    }

    #[tokio::test]
    async fn test_health() {
        let routes = HashMap::from([("/api/health", (200, r#"{"status": "healthy"}"#))]);
        let (base, _log) = serve(routes).await;
        let api = client(&base);

        let health = api.health().await.unwrap();
        assert_eq!(health.status, "healthy");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop to obtain a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = client(&format!("http://{}", addr));
        let result = api.portfolio_summary().await;
        assert!(matches!(result, Err(ApiError::Transport { .. })));
    }

    #[test]
    fn test_outcome_or_message() {
        let failed: ApiResult<()> = Err(ApiError::Transport {
            url: "http://x".to_string(),
            message: "boom".to_string(),
        });
        assert_eq!(
            outcome_or_message(failed, "Connection error"),
            ApiOutcome::Failure("Connection error".to_string())
        );
    }
}
