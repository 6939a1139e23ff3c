//! Text and JSON rendering of the dashboard screens.
//!
//! Renderers take the controller's state by reference and never mutate it.

use crate::analysis::{
    allocation, dividends_by_symbol, preview, sort_dividends, sort_orders, summarize_dividends,
    summarize_orders, unrealized_gain, unrealized_return_percent,
};
use crate::api::{ApiOutcome, PortfolioApi};
use crate::cli::OutputFormat;
use crate::config::DisplayConfig;
use crate::dashboard::{Dashboard, PortfolioData, Screen, Tab, ViewState};
use crate::models::{Dividend, Holding, Order, StockAnalysis};
use crate::report::format::{
    format_currency, format_date, format_dividend_rate, format_percentage, format_quantity,
    format_signed_percent,
};
use anyhow::Result;
use serde::Serialize;

const RULE: &str = "────────────────────────────────────────────────────────────";

/// Everything a renderer needs to draw one screen.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub screen: &'a Screen,
    pub data: &'a PortfolioData,
    pub view: &'a ViewState,
    pub display: &'a DisplayConfig,
}

/// Render whatever the controller currently shows in the requested format.
pub fn render_screen<A: PortfolioApi>(
    dashboard: &Dashboard<A>,
    display: &DisplayConfig,
    format: OutputFormat,
) -> Result<String> {
    let screen = dashboard.screen();
    let ctx = RenderContext {
        screen: &screen,
        data: dashboard.data(),
        view: dashboard.view(),
        display,
    };
    match format {
        OutputFormat::Text => Ok(render_text(&ctx)),
        OutputFormat::Json => render_json(&ctx),
    }
}

/// Render the current screen as text.
pub fn render_text(ctx: &RenderContext<'_>) -> String {
    match ctx.screen {
        Screen::Login { notice } => render_login(notice.as_deref()),
        Screen::Loading => "⏳ Loading portfolio data...\n".to_string(),
        Screen::Error { message } => render_error(message),
        Screen::Ready => render_dashboard(ctx),
    }
}

#[derive(Serialize)]
struct Snapshot<'a> {
    screen: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    view: &'a ViewState,
    data: &'a PortfolioData,
}

/// Render the current screen as a pretty-printed JSON snapshot.
pub fn render_json(ctx: &RenderContext<'_>) -> Result<String> {
    let (screen, message) = match ctx.screen {
        Screen::Login { notice } => ("login", notice.as_deref()),
        Screen::Loading => ("loading", None),
        Screen::Error { message } => ("error", Some(message.as_str())),
        Screen::Ready => ("dashboard", None),
    };

    let snapshot = Snapshot {
        screen,
        message,
        view: ctx.view,
        data: ctx.data,
    };
    serde_json::to_string_pretty(&snapshot).map_err(Into::into)
}

#[derive(Serialize)]
struct ActionResult<'a> {
    action: &'a str,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

/// One-line text result of a session action (logout, cache clear, ...).
pub fn render_action_text(action: &str, outcome: &ApiOutcome<()>) -> String {
    match outcome {
        ApiOutcome::Success(()) => format!("✅ {}: done\n", action),
        ApiOutcome::Failure(message) => format!("❌ {}: {}\n", action, message),
    }
}

pub fn render_action(
    action: &str,
    outcome: &ApiOutcome<()>,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_action_text(action, outcome)),
        OutputFormat::Json => render_action_json(action, outcome),
    }
}

pub fn render_action_json(action: &str, outcome: &ApiOutcome<()>) -> Result<String> {
    let result = ActionResult {
        action,
        success: outcome.is_success(),
        message: outcome.failure_message(),
    };
    serde_json::to_string_pretty(&result).map_err(Into::into)
}

fn render_login(notice: Option<&str>) -> String {
    let mut output = String::new();

    output.push_str("🔐 Portfolio Analyzer - Sign in\n");
    output.push_str(RULE);
    output.push('\n');
    output.push_str("Enter your username or email, password, and MFA code if enabled.\n");
    if let Some(notice) = notice {
        output.push_str(&format!("\n⚠️  {}\n", notice));
    }

    output
}

fn render_error(message: &str) -> String {
    let mut output = String::new();

    output.push_str("❌ Unable to load your portfolio\n\n");
    output.push_str(&format!("   {}\n\n", message));
    output.push_str("   ↻ Retry with `refresh` (or run the command again).\n");

    output
}

fn render_dashboard(ctx: &RenderContext<'_>) -> String {
    let mut output = String::new();

    output.push_str(&render_header(ctx.data));
    output.push_str(&render_summary(ctx.data, ctx.view.summary_expanded));
    output.push_str(&render_tab_bar(ctx.view.active_tab));

    let body = match ctx.view.active_tab {
        Tab::Overview => render_overview(ctx.data),
        Tab::Holdings => render_holdings(ctx.data, ctx.view),
        Tab::Dividends => render_dividends(ctx.data, ctx.view, ctx.display),
        Tab::Orders => render_orders(ctx.data, ctx.view, ctx.display),
        Tab::StockAnalysis => render_stock_analysis(ctx.data, ctx.display),
    };
    output.push_str(&body);

    output
}

fn render_header(data: &PortfolioData) -> String {
    match &data.user {
        Some(user) => format!(
            "📊 Portfolio Dashboard   [{}] {}\n\n",
            user.initial(),
            user.display_name()
        ),
        None => "📊 Portfolio Dashboard\n\n".to_string(),
    }
}

/// The four summary cards, plus account balances when expanded.
fn render_summary(data: &PortfolioData, expanded: bool) -> String {
    let summary = match &data.summary {
        Some(summary) => summary,
        None => return String::new(),
    };

    let mut section = String::new();

    section.push_str(&format!(
        "  💵 Total Equity   {:>14}    📈 Market Value {:>14}\n",
        format_currency(summary.total_equity),
        format_currency(summary.total_market_value)
    ));
    section.push_str(&format!(
        "  🧩 Positions      {:>14}    💰 Dividends    {:>14}\n",
        summary.total_positions,
        format_currency(summary.total_dividends)
    ));

    if expanded {
        match &data.account {
            Some(account) => {
                section.push_str(&format!(
                    "  🏦 Cash           {:>14}    ⚡ Buying Power {:>14}\n",
                    format_currency(account.cash),
                    format_currency(account.buying_power)
                ));
            }
            None => section.push_str("  Account details unavailable\n"),
        }
    }
    section.push('\n');

    section
}

fn render_tab_bar(active: Tab) -> String {
    let tabs: Vec<String> = Tab::ALL
        .iter()
        .map(|tab| {
            if *tab == active {
                format!("[{}]", tab.title())
            } else {
                format!(" {} ", tab.title())
            }
        })
        .collect();

    format!("{}\n{}\n\n", tabs.join(" "), RULE)
}

fn render_overview(data: &PortfolioData) -> String {
    let mut section = String::new();

    section.push_str("Allocation\n");
    match &data.holdings {
        Some(holdings) if !holdings.is_empty() => {
            for row in allocation(holdings) {
                section.push_str(&format!(
                    "  {:<8} {:>14}  {:>7}\n",
                    row.symbol,
                    format_currency(row.market_value),
                    format_percentage(row.percent)
                ));
            }
        }
        _ => section.push_str("  No holdings to show\n"),
    }
    section.push('\n');

    section.push_str("Account\n");
    match &data.account {
        Some(account) => {
            section.push_str(&format!("  Account #      {}\n", account.account_number));
            section.push_str(&format!(
                "  Total Value    {}\n",
                format_currency(account.total_value)
            ));
            section.push_str(&format!("  Cash           {}\n", format_currency(account.cash)));
            section.push_str(&format!(
                "  Buying Power   {}\n",
                format_currency(account.buying_power)
            ));
        }
        None => section.push_str("  Account information unavailable\n"),
    }
    section.push('\n');

    if let Some(user) = &data.user {
        section.push_str("Profile\n");
        section.push_str(&format!("  {} <{}>\n", user.display_name(), user.email));
        section.push('\n');
    }

    if let Some(open) = &data.open_orders {
        section.push_str(&format!("Open orders: {}\n", open.len()));
    }

    section
}

fn render_holdings(data: &PortfolioData, view: &ViewState) -> String {
    let holdings = match &data.holdings {
        Some(holdings) if !holdings.is_empty() => holdings,
        _ => return "No holdings to show\n".to_string(),
    };

    let mut section = String::new();
    for (symbol, holding) in holdings {
        section.push_str(&render_holding(
            symbol,
            holding,
            view.is_holding_expanded(symbol),
        ));
    }
    section.push_str("Use `expand <SYMBOL>` for details or `analyze <SYMBOL>` for trading history.\n");

    section
}

fn render_holding(symbol: &str, holding: &Holding, expanded: bool) -> String {
    let mut block = String::new();

    let marker = if expanded { "▾" } else { "▸" };
    let name = if holding.name.is_empty() {
        "Stock"
    } else {
        holding.name.as_str()
    };
    block.push_str(&format!(
        "{} {:<8} {:<28} {:>12} {:>9}\n",
        marker,
        symbol,
        name,
        format_currency(holding.price),
        format_signed_percent(holding.percent_change)
    ));
    block.push_str(&format!(
        "    Qty {} | Market Value {} | Avg Cost {} | Today {}\n",
        format_quantity(holding.quantity),
        format_currency(holding.market_value),
        format_currency(holding.average_buy_price),
        format_currency(holding.total_return_today)
    ));

    if expanded {
        if let Some(pe) = holding.pe_ratio {
            block.push_str(&format!("    P/E Ratio        {:.2}\n", pe));
        }
        if let Some(dividend_yield) = holding.dividend_yield {
            block.push_str(&format!(
                "    Dividend Yield   {}\n",
                format_percentage(dividend_yield)
            ));
        }
        block.push_str(&format!(
            "    Total Investment {}\n",
            format_currency(holding.average_buy_price * holding.quantity)
        ));
        let gain = unrealized_gain(holding);
        match unrealized_return_percent(holding) {
            Some(pct) => block.push_str(&format!(
                "    Unrealized       {} ({})\n",
                format_currency(gain),
                format_signed_percent(pct)
            )),
            None => block.push_str(&format!("    Unrealized       {}\n", format_currency(gain))),
        }
    }
    block.push('\n');

    block
}

fn render_dividend_line(dividend: &Dividend) -> String {
    format!(
        "  {}  {:<6} {:>12}  {} x {} shares  {}\n",
        format_date(dividend.effective_date()),
        dividend.symbol,
        format_currency(dividend.amount),
        format_dividend_rate(dividend.rate),
        format_quantity(dividend.position),
        dividend.status()
    )
}

fn render_order_line(order: &Order) -> String {
    format!(
        "  {}  {} {:<4} {:<6} {} @ {} = {}  {} ({}, {})\n",
        format_date(Some(order.created_at.as_str())),
        order.status().marker(),
        order.side,
        order.symbol,
        format_quantity(order.quantity),
        format_currency(order.price),
        format_currency(order.total()),
        order.state,
        order.order_type,
        order.time_in_force
    )
}

fn render_dividends(data: &PortfolioData, view: &ViewState, display: &DisplayConfig) -> String {
    let dividends = match &data.dividends {
        Some(dividends) if !dividends.is_empty() => dividends,
        _ => return "No dividend history\n".to_string(),
    };

    let mut section = String::new();

    let summary = summarize_dividends(dividends);
    section.push_str(&format!(
        "Total received {} across {} symbols ({} paid, {} pending)\n\n",
        format_currency(summary.total_amount),
        summary.symbol_count,
        summary.paid_count,
        summary.pending_count
    ));

    let sorted = sort_dividends(dividends);
    let shown = preview(&sorted, display.dividends_preview, view.show_all_dividends);
    for dividend in shown.items {
        section.push_str(&render_dividend_line(dividend));
    }
    if shown.hidden > 0 {
        section.push_str(&format!(
            "  ... {} more (`dividends all` to show everything)\n",
            shown.hidden
        ));
    }

    section.push_str("\nBy symbol\n");
    for (symbol, total) in dividends_by_symbol(dividends) {
        section.push_str(&format!("  {:<8} {:>12}\n", symbol, format_currency(total)));
    }

    section
}

fn render_orders(data: &PortfolioData, view: &ViewState, display: &DisplayConfig) -> String {
    let mut section = String::new();

    let orders = data.orders.as_deref().unwrap_or_default();
    let open_orders = data.open_orders.as_deref().unwrap_or_default();
    let summary = summarize_orders(orders, open_orders);
    section.push_str(&format!(
        "{} orders ({} buys, {} sells), {} open\n\n",
        summary.total, summary.buys, summary.sells, summary.open
    ));

    if !open_orders.is_empty() {
        section.push_str("Open orders\n");
        for order in sort_orders(open_orders) {
            section.push_str(&render_order_line(&order));
        }
        section.push('\n');
    }

    if orders.is_empty() {
        section.push_str("No order history\n");
        return section;
    }

    section.push_str("Order history\n");
    let sorted = sort_orders(orders);
    let shown = preview(&sorted, display.orders_preview, view.show_all_orders);
    for order in shown.items {
        section.push_str(&render_order_line(order));
    }
    if shown.hidden > 0 {
        section.push_str(&format!(
            "  ... {} more (`orders all` to show everything)\n",
            shown.hidden
        ));
    }

    section
}

fn render_stock_analysis(data: &PortfolioData, display: &DisplayConfig) -> String {
    let symbol = match &data.selected_stock {
        Some(symbol) => symbol,
        None => {
            return "Select a holding to analyze (`analyze <SYMBOL>`).\n".to_string();
        }
    };

    if let Some(message) = &data.analysis_error {
        return format!(
            "❌ Could not analyze {}: {}\n\nUse `back` to return to holdings.\n",
            symbol, message
        );
    }

    match &data.stock_analysis {
        Some(analysis) => render_analysis(symbol, analysis, display),
        None => format!("⏳ Loading analysis for {}...\n", symbol),
    }
}

fn render_analysis(symbol: &str, analysis: &StockAnalysis, display: &DisplayConfig) -> String {
    let mut section = String::new();

    if analysis.name.is_empty() {
        section.push_str(&format!("🔎 {}\n\n", symbol));
    } else {
        section.push_str(&format!("🔎 {} ({})\n\n", analysis.name, symbol));
    }

    if let Some(holding) = &analysis.current_holding {
        section.push_str("Current position\n");
        section.push_str(&format!(
            "  {} shares @ {} = {} (avg cost {})\n\n",
            format_quantity(holding.quantity),
            format_currency(holding.price),
            format_currency(holding.market_value),
            format_currency(holding.average_buy_price)
        ));
    }

    if let Some(metrics) = &analysis.metrics {
        section.push_str("Trading metrics\n");
        section.push_str(&format!(
            "  Orders {} ({} buys, {} sells)\n",
            metrics.total_orders, metrics.buy_orders, metrics.sell_orders
        ));
        section.push_str(&format!(
            "  Bought {} | Sold {} | Net {}\n",
            format_quantity(metrics.total_bought_quantity),
            format_quantity(metrics.total_sold_quantity),
            format_quantity(metrics.net_quantity)
        ));
        section.push_str(&format!(
            "  Avg price {} | Dividends {}\n\n",
            format_currency(metrics.calculated_avg_price),
            format_currency(metrics.total_dividend_amount)
        ));
    }

    section.push_str("Recent orders\n");
    let orders = sort_orders(&analysis.orders);
    let shown = preview(&orders, display.analysis_preview, false);
    if shown.items.is_empty() {
        section.push_str("  None\n");
    }
    for order in shown.items {
        section.push_str(&render_order_line(order));
    }

    section.push_str("\nDividend history\n");
    let dividends = sort_dividends(&analysis.dividends);
    let shown = preview(&dividends, display.analysis_preview, false);
    if shown.items.is_empty() {
        section.push_str("  None\n");
    }
    for dividend in shown.items {
        section.push_str(&render_dividend_line(dividend));
    }

    section.push_str("\nUse `back` to return to holdings.\n");
    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::testing::{analysis, dividend, holdings, order};
    use crate::models::{AccountInfo, OrderSide, PortfolioSummary, UserInfo};

    fn loaded() -> PortfolioData {
        PortfolioData {
            summary: Some(PortfolioSummary {
                total_equity: 12.5,
                total_market_value: 1360.0,
                total_positions: 2,
                total_dividends: 0.25,
            }),
            holdings: Some(holdings()),
            dividends: Some(vec![
                dividend("d1", "KO", "paid", Some("2024-01-15T00:00:00Z")),
                dividend("d2", "AAPL", "pending", None),
            ]),
            orders: Some(vec![
                order("o1", "AAPL", OrderSide::Buy, "2024-01-02T15:00:00Z"),
                order("o2", "MSFT", OrderSide::Sell, "2024-03-02T15:00:00Z"),
            ]),
            open_orders: Some(Vec::new()),
            account: Some(AccountInfo {
                account_number: "5RX00001".to_string(),
                buying_power: 250.0,
                cash: 250.0,
                sma: 0.0,
                total_value: 1610.0,
            }),
            user: Some(UserInfo {
                email: "trader@example.com".to_string(),
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                username: "trader".to_string(),
            }),
            ..Default::default()
        }
    }

    fn render(data: &PortfolioData, view: &ViewState) -> String {
        let display = DisplayConfig::default();
        render_text(&RenderContext {
            screen: &Screen::Ready,
            data,
            view,
            display: &display,
        })
    }

    fn view_on(tab: Tab) -> ViewState {
        let mut view = ViewState::default();
        view.change_tab(tab);
        view
    }

    #[test]
    fn test_summary_money_two_decimals() {
        let text = render(&loaded(), &ViewState::default());
        assert!(text.contains("$12.50"));
        assert!(text.contains("$1360.00"));
        assert!(text.contains("$0.25"));
        assert!(text.contains("[Overview]"));
        assert!(text.contains("Jane Doe"));
    }

    #[test]
    fn test_summary_expansion_shows_balances() {
        let mut view = ViewState::default();
        assert!(!render(&loaded(), &view).contains("🏦 Cash"));
        view.toggle_summary();
        assert!(render(&loaded(), &view).contains("🏦 Cash"));
    }

    #[test]
    fn test_dividend_rate_four_decimals() {
        let text = render(&loaded(), &view_on(Tab::Dividends));
        assert!(text.contains("$0.2500"));
        assert!(text.contains("[Dividends]"));
        // Newest first: the pending AAPL entry is payable 2024-02-15.
        let aapl = text.find("2024-02-15").unwrap();
        let ko = text.find("2024-01-15").unwrap();
        assert!(aapl < ko);
    }

    #[test]
    fn test_dividends_truncate_to_preview() {
        let mut data = loaded();
        data.dividends = Some(
            (1..=7)
                .map(|day| {
                    dividend(
                        &format!("d{}", day),
                        "KO",
                        "paid",
                        Some(&format!("2024-01-0{}", day)),
                    )
                })
                .collect(),
        );

        let text = render(&data, &view_on(Tab::Dividends));
        assert!(text.contains("2024-01-07"));
        assert!(!text.contains("2024-01-02"));
        assert!(text.contains("... 2 more"));

        let mut view = view_on(Tab::Dividends);
        view.toggle_show_all_dividends();
        let text = render(&data, &view);
        assert!(text.contains("2024-01-01"));
        assert!(!text.contains("more (`dividends all`"));
    }

    #[test]
    fn test_orders_newest_first_and_truncated() {
        let mut data = loaded();
        data.orders = Some(
            (1..=12)
                .map(|day| {
                    order(
                        &format!("o{}", day),
                        "AAPL",
                        OrderSide::Buy,
                        &format!("2024-05-{:02}T10:00:00Z", day),
                    )
                })
                .collect(),
        );

        let text = render(&data, &view_on(Tab::Orders));
        assert!(text.find("2024-05-12").unwrap() < text.find("2024-05-11").unwrap());
        assert!(!text.contains("2024-05-02"));
        assert!(text.contains("... 2 more"));
        assert!(text.contains("12 orders (12 buys, 0 sells), 0 open"));
    }

    #[test]
    fn test_holding_expansion() {
        let mut view = view_on(Tab::Holdings);
        let collapsed = render(&loaded(), &view);
        assert!(collapsed.contains("▸ AAPL"));
        assert!(!collapsed.contains("Total Investment"));

        view.toggle_holding("AAPL");
        let expanded = render(&loaded(), &view);
        assert!(expanded.contains("▾ AAPL"));
        assert!(expanded.contains("Total Investment $750.00"));
        assert!(expanded.contains("P/E Ratio        29.50"));
        assert!(expanded.contains("▸ MSFT"));
    }

    #[test]
    fn test_missing_section_renders_placeholder() {
        let mut data = loaded();
        data.holdings = None;
        assert!(render(&data, &view_on(Tab::Holdings)).contains("No holdings to show"));
        data.dividends = None;
        assert!(render(&data, &view_on(Tab::Dividends)).contains("No dividend history"));
    }

    #[test]
    fn test_stock_analysis_panel() {
        let mut data = loaded();
        data.selected_stock = Some("AAPL".to_string());
        data.stock_analysis = Some(analysis());

        let text = render(&data, &view_on(Tab::StockAnalysis));
        assert!(text.contains("🔎 Apple (AAPL)"));
        assert!(text.contains("Orders 2 (1 buys, 1 sells)"));
        assert!(text.contains("Use `back`"));

        data.stock_analysis = None;
        data.analysis_error = Some("Unknown symbol".to_string());
        let text = render(&data, &view_on(Tab::StockAnalysis));
        assert!(text.contains("Could not analyze AAPL: Unknown symbol"));
    }

    #[test]
    fn test_analysis_lists_at_most_five() {
        let mut many = analysis();
        many.orders = (1..=8)
            .map(|day| {
                order(
                    &format!("o{}", day),
                    "AAPL",
                    OrderSide::Buy,
                    &format!("2023-07-0{}", day),
                )
            })
            .collect();
        let mut data = loaded();
        data.selected_stock = Some("AAPL".to_string());
        data.stock_analysis = Some(many);

        let text = render(&data, &view_on(Tab::StockAnalysis));
        assert!(text.contains("2023-07-08"));
        assert!(text.contains("2023-07-04"));
        assert!(!text.contains("2023-07-03"));
    }

    #[test]
    fn test_error_and_login_screens() {
        let display = DisplayConfig::default();
        let data = PortfolioData::default();
        let view = ViewState::default();

        let error = Screen::Error {
            message: "X".to_string(),
        };
        let text = render_text(&RenderContext {
            screen: &error,
            data: &data,
            view: &view,
            display: &display,
        });
        assert!(text.contains("X"));
        assert!(text.contains("Retry"));

        let login = Screen::Login {
            notice: Some("Invalid credentials".to_string()),
        };
        let text = render_text(&RenderContext {
            screen: &login,
            data: &data,
            view: &view,
            display: &display,
        });
        assert!(text.contains("Sign in"));
        assert!(text.contains("Invalid credentials"));
    }

    #[test]
    fn test_json_snapshot() {
        let display = DisplayConfig::default();
        let data = loaded();
        let view = view_on(Tab::Holdings);
        let json = render_json(&RenderContext {
            screen: &Screen::Ready,
            data: &data,
            view: &view,
            display: &display,
        })
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["screen"], "dashboard");
        assert_eq!(value["view"]["active_tab"], "holdings");
        assert_eq!(value["data"]["summary"]["total_equity"], 12.5);
        assert!(value.get("message").is_none());
    }

    #[test]
    fn test_action_rendering() {
        let ok = ApiOutcome::Success(());
        let failed = ApiOutcome::Failure("nope".to_string());
        assert_eq!(render_action_text("Logout", &ok), "✅ Logout: done\n");
        assert!(render_action_text("Logout", &failed).contains("nope"));

        let json = render_action_json("clear-cache", &failed).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["message"], "nope");
    }
}
