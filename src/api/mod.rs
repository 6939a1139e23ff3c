//! Portfolio backend API.
//!
//! [`PortfolioApi`] is the seam between the dashboard controller and the
//! network; [`ApiClient`] is the reqwest implementation.

pub mod client;
pub mod envelope;

pub use client::{ApiClient, ClientConfig};
pub use envelope::ApiOutcome;

use crate::models::{
    AccountInfo, Dividend, HealthStatus, Holdings, LoginRequest, Order, PortfolioSummary,
    StockAnalysis, UserInfo,
};
use async_trait::async_trait;
use thiserror::Error;

/// Failure to obtain any decodable answer from the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Result of a call that reached the backend, or the reason it did not.
pub type ApiResult<T> = Result<ApiOutcome<T>, ApiError>;

/// Operations offered by the portfolio backend.
#[async_trait]
pub trait PortfolioApi: Send + Sync {
    /// `POST /api/auth/login`
    async fn login(&self, request: &LoginRequest) -> ApiResult<()>;

    /// `POST /api/auth/logout`
    async fn logout(&self) -> ApiResult<()>;

    /// `POST /api/session/clear`
    async fn clear_session(&self) -> ApiResult<()>;

    /// `POST /api/cache/clear`
    async fn clear_cache(&self) -> ApiResult<()>;

    /// `GET /api/portfolio/summary`
    async fn portfolio_summary(&self) -> ApiResult<PortfolioSummary>;

    /// `GET /api/portfolio/holdings`
    async fn holdings(&self) -> ApiResult<Holdings>;

    /// `GET /api/portfolio/dividends`
    async fn dividends(&self) -> ApiResult<Vec<Dividend>>;

    /// `GET /api/orders/all`
    async fn all_orders(&self) -> ApiResult<Vec<Order>>;

    /// `GET /api/orders/open`
    async fn open_orders(&self) -> ApiResult<Vec<Order>>;

    /// `GET /api/account/info`
    async fn account_info(&self) -> ApiResult<AccountInfo>;

    /// `GET /api/user/info`
    async fn user_info(&self) -> ApiResult<UserInfo>;

    /// `GET /api/stock/{symbol}`
    async fn stock_analysis(&self, symbol: &str) -> ApiResult<StockAnalysis>;

    /// `GET /api/health`
    async fn health(&self) -> Result<HealthStatus, ApiError>;
}
