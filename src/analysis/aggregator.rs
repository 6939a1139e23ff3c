//! Sorting, truncation and summary statistics over holdings, dividends and
//! orders.

use crate::models::{parse_timestamp, Dividend, DividendState, Holding, Holdings, Order, OrderSide};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

/// Totals shown above the dividends list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DividendSummary {
    pub total_amount: f64,
    pub paid_count: usize,
    pub pending_count: usize,
    pub symbol_count: usize,
}

/// Counts shown above the orders list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub total: usize,
    pub open: usize,
    pub buys: usize,
    pub sells: usize,
}

/// One row of the allocation breakdown on the overview tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub symbol: String,
    pub market_value: f64,
    pub percent: f64,
}

/// A window over a sorted list: the rows to show and how many are hidden.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview<'a, T> {
    pub items: &'a [T],
    pub hidden: usize,
}

fn newest_first<T, F>(items: &[T], date: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> Option<NaiveDateTime>,
{
    let mut sorted = items.to_vec();
    // Stable sort; undated rows sink to the bottom in their original order.
    sorted.sort_by_key(|item| Reverse(date(item)));
    sorted
}

/// Dividends sorted by payment date, newest first. Unpaid entries use their
/// payable date.
pub fn sort_dividends(dividends: &[Dividend]) -> Vec<Dividend> {
    newest_first(dividends, |d| d.effective_date().and_then(parse_timestamp))
}

/// Orders sorted by creation time, newest first.
pub fn sort_orders(orders: &[Order]) -> Vec<Order> {
    newest_first(orders, |o| parse_timestamp(&o.created_at))
}

/// Take the first `limit` items unless `show_all` is set.
pub fn preview<T>(items: &[T], limit: usize, show_all: bool) -> Preview<'_, T> {
    if show_all || items.len() <= limit {
        return Preview { items, hidden: 0 };
    }
    Preview {
        items: &items[..limit],
        hidden: items.len() - limit,
    }
}

pub fn summarize_dividends(dividends: &[Dividend]) -> DividendSummary {
    let mut summary = DividendSummary::default();
    let mut symbols = BTreeSet::new();

    for dividend in dividends {
        summary.total_amount += dividend.amount;
        match dividend.status() {
            DividendState::Paid => summary.paid_count += 1,
            DividendState::Pending => summary.pending_count += 1,
            DividendState::Other(_) => {}
        }
        if !dividend.symbol.is_empty() {
            symbols.insert(dividend.symbol.as_str());
        }
    }

    summary.symbol_count = symbols.len();
    summary
}

pub fn summarize_orders(orders: &[Order], open_orders: &[Order]) -> OrderSummary {
    OrderSummary {
        total: orders.len(),
        open: open_orders.len(),
        buys: orders.iter().filter(|o| o.side == OrderSide::Buy).count(),
        sells: orders.iter().filter(|o| o.side == OrderSide::Sell).count(),
    }
}

/// Dividend income per symbol, largest first.
pub fn dividends_by_symbol(dividends: &[Dividend]) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for dividend in dividends {
        *totals.entry(dividend.symbol.as_str()).or_default() += dividend.amount;
    }

    let mut rows: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(symbol, total)| (symbol.to_string(), total))
        .collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));
    rows
}

/// Share of total market value per holding, largest first.
pub fn allocation(holdings: &Holdings) -> Vec<Allocation> {
    let total: f64 = holdings.values().map(|h| h.market_value).sum();

    let mut rows: Vec<Allocation> = holdings
        .iter()
        .map(|(symbol, holding)| Allocation {
            symbol: symbol.clone(),
            market_value: holding.market_value,
            percent: if total > 0.0 {
                holding.market_value / total * 100.0
            } else {
                0.0
            },
        })
        .collect();
    rows.sort_by(|a, b| b.market_value.total_cmp(&a.market_value));
    rows
}

pub fn cost_basis(holding: &Holding) -> f64 {
    holding.average_buy_price * holding.quantity
}

/// Unrealised gain against the average buy price.
pub fn unrealized_gain(holding: &Holding) -> f64 {
    holding.market_value - cost_basis(holding)
}

/// Unrealised gain as a percentage of cost basis; `None` without a basis.
pub fn unrealized_return_percent(holding: &Holding) -> Option<f64> {
    let basis = cost_basis(holding);
    if basis > 0.0 {
        Some(unrealized_gain(holding) / basis * 100.0)
    } else {
        None
    }
}
