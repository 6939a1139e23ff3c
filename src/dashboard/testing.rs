//! In-memory [`PortfolioApi`] used by the dashboard tests.

use crate::api::{ApiError, ApiOutcome, ApiResult, PortfolioApi};
use crate::models::{
    AccountInfo, AnalysisHolding, Dividend, HealthStatus, Holding, Holdings, LoginRequest, Order,
    OrderSide, PortfolioSummary, StockAnalysis, TradingMetrics, UserInfo,
};
use async_trait::async_trait;
use std::sync::Mutex;

/// A canned reply; `Err` simulates a request that never reached the server.
pub type Canned<T> = Result<ApiOutcome<T>, String>;

pub struct FakeApi {
    pub login: Canned<()>,
    pub logout: Canned<()>,
    pub clear_session: Canned<()>,
    pub clear_cache: Canned<()>,
    pub summary: Canned<PortfolioSummary>,
    pub holdings: Canned<Holdings>,
    pub dividends: Canned<Vec<Dividend>>,
    pub orders: Canned<Vec<Order>>,
    pub open_orders: Canned<Vec<Order>>,
    pub account: Canned<AccountInfo>,
    pub user: Canned<UserInfo>,
    pub analysis: Canned<StockAnalysis>,
    calls: Mutex<Vec<&'static str>>,
    analysis_symbols: Mutex<Vec<String>>,
    login_requests: Mutex<Vec<LoginRequest>>,
}

fn replay<T: Clone>(canned: &Canned<T>, name: &str) -> ApiResult<T> {
    canned.clone().map_err(|message| ApiError::Transport {
        url: format!("fake://{}", name),
        message,
    })
}

pub fn order(id: &str, symbol: &str, side: OrderSide, created_at: &str) -> Order {
    Order {
        id: id.to_string(),
        symbol: symbol.to_string(),
        side,
        order_type: "market".to_string(),
        quantity: 2.0,
        price: 100.0,
        state: "filled".to_string(),
        time_in_force: "gfd".to_string(),
        created_at: created_at.to_string(),
        updated_at: None,
        executed_at: None,
    }
}

pub fn dividend(id: &str, symbol: &str, state: &str, paid_at: Option<&str>) -> Dividend {
    Dividend {
        id: id.to_string(),
        symbol: symbol.to_string(),
        amount: 12.5,
        rate: 0.25,
        position: 50.0,
        paid_at: paid_at.map(String::from),
        payable_date: Some("2024-02-15".to_string()),
        record_date: None,
        state: state.to_string(),
    }
}

pub fn holdings() -> Holdings {
    let mut holdings = Holdings::new();
    holdings.insert(
        "AAPL".to_string(),
        Holding {
            name: "Apple".to_string(),
            price: 190.0,
            percent_change: 1.25,
            quantity: 5.0,
            market_value: 950.0,
            equity: 950.0,
            average_buy_price: 150.0,
            total_return_today: 12.5,
            pe_ratio: Some(29.5),
            dividend_yield: Some(0.5),
        },
    );
    holdings.insert(
        "MSFT".to_string(),
        Holding {
            name: "Microsoft".to_string(),
            price: 410.0,
            percent_change: -0.5,
            quantity: 1.0,
            market_value: 410.0,
            equity: 410.0,
            average_buy_price: 300.0,
            total_return_today: -2.0,
            pe_ratio: None,
            dividend_yield: None,
        },
    );
    holdings
}

pub fn analysis() -> StockAnalysis {
    StockAnalysis {
        symbol: "AAPL".to_string(),
        name: "Apple".to_string(),
        current_holding: Some(AnalysisHolding {
            quantity: 5.0,
            price: 190.0,
            market_value: 950.0,
            average_buy_price: 150.0,
        }),
        metrics: Some(TradingMetrics {
            total_bought_quantity: 6.0,
            total_sold_quantity: 1.0,
            net_quantity: 5.0,
            total_orders: 2,
            buy_orders: 1,
            sell_orders: 1,
            calculated_avg_price: 150.0,
            total_dividend_amount: 12.5,
        }),
        orders: vec![order("o1", "AAPL", OrderSide::Buy, "2024-01-02T15:00:00Z")],
        dividends: vec![dividend("d1", "AAPL", "paid", Some("2024-02-15T00:00:00Z"))],
    }
}

impl FakeApi {
    /// Every endpoint succeeds with a small, consistent portfolio.
    pub fn healthy() -> Self {
        Self {
            login: Ok(ApiOutcome::Success(())),
            logout: Ok(ApiOutcome::Success(())),
            clear_session: Ok(ApiOutcome::Success(())),
            clear_cache: Ok(ApiOutcome::Success(())),
            summary: Ok(ApiOutcome::Success(PortfolioSummary {
                total_equity: 12.5,
                total_market_value: 1360.0,
                total_positions: 2,
                total_dividends: 0.25,
            })),
            holdings: Ok(ApiOutcome::Success(holdings())),
            dividends: Ok(ApiOutcome::Success(vec![
                dividend("d1", "KO", "paid", Some("2024-01-15T00:00:00Z")),
                dividend("d2", "AAPL", "pending", None),
            ])),
            orders: Ok(ApiOutcome::Success(vec![
                order("o1", "AAPL", OrderSide::Buy, "2024-01-02T15:00:00Z"),
                order("o2", "MSFT", OrderSide::Sell, "2024-03-02T15:00:00Z"),
            ])),
            open_orders: Ok(ApiOutcome::Success(vec![order(
                "o3",
                "KO",
                OrderSide::Buy,
                "2024-03-05T15:00:00Z",
            )])),
            account: Ok(ApiOutcome::Success(AccountInfo {
                account_number: "5RX00001".to_string(),
                buying_power: 250.0,
                cash: 250.0,
                sma: 0.0,
                total_value: 1610.0,
            })),
            user: Ok(ApiOutcome::Success(UserInfo {
                email: "trader@example.com".to_string(),
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                username: "trader".to_string(),
            })),
            analysis: Ok(ApiOutcome::Success(analysis())),
            calls: Mutex::new(Vec::new()),
            analysis_symbols: Mutex::new(Vec::new()),
            login_requests: Mutex::new(Vec::new()),
        }
    }

    /// Make one endpoint fail before reaching the server.
    pub fn fail_transport(&mut self, endpoint: &str) {
        let message = "connection refused".to_string();
        match endpoint {
            "login" => self.login = Err(message),
            "summary" => self.summary = Err(message),
            "holdings" => self.holdings = Err(message),
            "dividends" => self.dividends = Err(message),
            "orders" => self.orders = Err(message),
            "open_orders" => self.open_orders = Err(message),
            "account" => self.account = Err(message),
            "user" => self.user = Err(message),
            "analysis" => self.analysis = Err(message),
            other => panic!("unknown fake endpoint: {}", other),
        }
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    pub fn analysis_requests(&self) -> Vec<String> {
        self.analysis_symbols.lock().unwrap().clone()
    }

    pub fn login_requests(&self) -> Vec<LoginRequest> {
        self.login_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PortfolioApi for FakeApi {
    async fn login(&self, request: &LoginRequest) -> ApiResult<()> {
        self.record("login");
        self.login_requests.lock().unwrap().push(request.clone());
        replay(&self.login, "login")
    }

    async fn logout(&self) -> ApiResult<()> {
        self.record("logout");
        replay(&self.logout, "logout")
    }

    async fn clear_session(&self) -> ApiResult<()> {
        self.record("clear_session");
        replay(&self.clear_session, "clear_session")
    }

    async fn clear_cache(&self) -> ApiResult<()> {
        self.record("clear_cache");
        replay(&self.clear_cache, "clear_cache")
    }

    async fn portfolio_summary(&self) -> ApiResult<PortfolioSummary> {
        self.record("summary");
        replay(&self.summary, "summary")
    }

    async fn holdings(&self) -> ApiResult<Holdings> {
        self.record("holdings");
        replay(&self.holdings, "holdings")
    }

    async fn dividends(&self) -> ApiResult<Vec<Dividend>> {
        self.record("dividends");
        replay(&self.dividends, "dividends")
    }

    async fn all_orders(&self) -> ApiResult<Vec<Order>> {
        self.record("orders");
        replay(&self.orders, "orders")
    }

    async fn open_orders(&self) -> ApiResult<Vec<Order>> {
        self.record("open_orders");
        replay(&self.open_orders, "open_orders")
    }

    async fn account_info(&self) -> ApiResult<AccountInfo> {
        self.record("account");
        replay(&self.account, "account")
    }

    async fn user_info(&self) -> ApiResult<UserInfo> {
        self.record("user");
        replay(&self.user, "user")
    }

    async fn stock_analysis(&self, symbol: &str) -> ApiResult<StockAnalysis> {
        self.record("analysis");
        self.analysis_symbols.lock().unwrap().push(symbol.to_string());
        replay(&self.analysis, "analysis")
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.record("health");
        Ok(HealthStatus {
            status: "healthy".to_string(),
        })
    }
}
