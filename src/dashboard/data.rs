//! Fetched dashboard data and the concurrent fan-out that fills it.

use crate::api::{ApiOutcome, PortfolioApi};
use crate::models::{
    AccountInfo, Dividend, Holdings, Order, PortfolioSummary, StockAnalysis, UserInfo,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Page-level error when the batch itself could not complete.
pub const BATCH_FAILURE_MESSAGE: &str = "Failed to load portfolio data. Please try again.";

/// Page-level error when the summary fails without a message.
pub const SUMMARY_FAILURE_MESSAGE: &str = "Failed to load portfolio data";

/// Shown in the analysis panel when the analysis request could not complete.
pub const ANALYSIS_FAILURE_MESSAGE: &str = "Failed to load stock analysis. Please try again.";

/// Snapshot of everything the dashboard has fetched.
///
/// Each section is replaced wholesale on every fetch; `None` means the
/// section is unavailable and renders as an empty placeholder.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PortfolioData {
    pub summary: Option<PortfolioSummary>,
    pub holdings: Option<Holdings>,
    pub dividends: Option<Vec<Dividend>>,
    pub orders: Option<Vec<Order>>,
    pub open_orders: Option<Vec<Order>>,
    pub account: Option<AccountInfo>,
    pub user: Option<UserInfo>,
    pub selected_stock: Option<String>,
    pub stock_analysis: Option<StockAnalysis>,
    pub analysis_error: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Keep a section's payload, logging why it is missing otherwise.
fn section<T>(name: &str, outcome: ApiOutcome<T>) -> Option<T> {
    if let Some(message) = outcome.failure_message() {
        warn!("Failed to load {}: {}", name, message);
    }
    outcome.ok()
}

impl PortfolioData {
    /// Fetch all seven dashboard resources concurrently.
    ///
    /// A transport failure in any request fails the whole batch. A failed
    /// summary sets the page-level error; any other failed section is left
    /// empty.
    pub async fn fetch_all<A: PortfolioApi + ?Sized>(&mut self, api: &A) {
        self.loading = true;
        self.error = None;
        info!("Fetching portfolio data");

        let batch = futures::try_join!(
            api.portfolio_summary(),
            api.holdings(),
            api.dividends(),
            api.all_orders(),
            api.open_orders(),
            api.account_info(),
            api.user_info(),
        );

        let (summary, holdings, dividends, orders, open_orders, account, user) = match batch {
            Ok(outcomes) => outcomes,
            Err(e) => {
                warn!("Portfolio fetch failed: {}", e);
                self.loading = false;
                self.error = Some(BATCH_FAILURE_MESSAGE.to_string());
                return;
            }
        };

        match summary {
            ApiOutcome::Success(data) => self.summary = Some(data),
            ApiOutcome::Failure(message) => {
                warn!("Failed to load portfolio summary: {}", message);
                self.summary = None;
                self.error = Some(if message.trim().is_empty() {
                    SUMMARY_FAILURE_MESSAGE.to_string()
                } else {
                    message
                });
            }
        }

        self.holdings = section("holdings", holdings);
        self.dividends = section("dividends", dividends);
        self.orders = section("orders", orders);
        self.open_orders = section("open orders", open_orders);
        self.account = section("account info", account);
        self.user = section("user info", user);
        self.loading = false;

        debug!(
            "Loaded {} holdings, {} dividends, {} orders",
            self.holdings.as_ref().map_or(0, |h| h.len()),
            self.dividends.as_ref().map_or(0, |d| d.len()),
            self.orders.as_ref().map_or(0, |o| o.len()),
        );
    }

    /// Fetch the analysis for one symbol. Returns whether it succeeded.
    pub async fn fetch_stock_analysis<A: PortfolioApi + ?Sized>(
        &mut self,
        api: &A,
        symbol: &str,
    ) -> bool {
        self.selected_stock = Some(symbol.to_string());
        self.stock_analysis = None;
        self.analysis_error = None;
        info!("Fetching stock analysis for {}", symbol);

        match api.stock_analysis(symbol).await {
            Ok(ApiOutcome::Success(analysis)) => {
                self.stock_analysis = Some(analysis);
                true
            }
            Ok(ApiOutcome::Failure(message)) => {
                warn!("Stock analysis for {} failed: {}", symbol, message);
                self.analysis_error = Some(message);
                false
            }
            Err(e) => {
                warn!("Stock analysis for {} failed: {}", symbol, e);
                self.analysis_error = Some(ANALYSIS_FAILURE_MESSAGE.to_string());
                false
            }
        }
    }

    pub fn clear_stock_analysis(&mut self) {
        self.selected_stock = None;
        self.stock_analysis = None;
        self.analysis_error = None;
    }

    /// Drop every fetched section.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
