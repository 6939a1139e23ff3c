//! Tab navigation and expand/collapse state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// The dashboard's views. Every tab is reachable from every other tab.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    #[default]
    Overview,
    Holdings,
    Dividends,
    Orders,
    StockAnalysis,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Overview,
        Tab::Holdings,
        Tab::Dividends,
        Tab::Orders,
        Tab::StockAnalysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Overview => "overview",
            Tab::Holdings => "holdings",
            Tab::Dividends => "dividends",
            Tab::Orders => "orders",
            Tab::StockAnalysis => "stock-analysis",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Holdings => "Holdings",
            Tab::Dividends => "Dividends",
            Tab::Orders => "Orders",
            Tab::StockAnalysis => "Stock Analysis",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "overview" => Ok(Tab::Overview),
            "holdings" => Ok(Tab::Holdings),
            "dividends" => Ok(Tab::Dividends),
            "orders" => Ok(Tab::Orders),
            "stock-analysis" | "stock" | "analysis" => Ok(Tab::StockAnalysis),
            other => Err(format!("unknown tab: {}", other)),
        }
    }
}

/// Transient view state owned by the dashboard controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub active_tab: Tab,
    pub expanded_holdings: BTreeSet<String>,
    pub show_all_orders: bool,
    pub show_all_dividends: bool,
    pub summary_expanded: bool,
}

impl ViewState {
    pub fn change_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    pub fn open_stock_analysis(&mut self) {
        self.active_tab = Tab::StockAnalysis;
    }

    pub fn back_to_holdings(&mut self) {
        self.active_tab = Tab::Holdings;
    }

    /// Flip a holding between expanded and collapsed.
    pub fn toggle_holding(&mut self, symbol: &str) {
        if !self.expanded_holdings.remove(symbol) {
            self.expanded_holdings.insert(symbol.to_string());
        }
    }

    pub fn is_holding_expanded(&self, symbol: &str) -> bool {
        self.expanded_holdings.contains(symbol)
    }

    pub fn toggle_show_all_orders(&mut self) {
        self.show_all_orders = !self.show_all_orders;
    }

    pub fn toggle_show_all_dividends(&mut self) {
        self.show_all_dividends = !self.show_all_dividends;
    }

    pub fn toggle_summary(&mut self) {
        self.summary_expanded = !self.summary_expanded;
    }

    /// Collapse everything but keep the active tab.
    pub fn collapse_all(&mut self) {
        self.expanded_holdings.clear();
        self.show_all_orders = false;
        self.show_all_dividends = false;
        self.summary_expanded = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
