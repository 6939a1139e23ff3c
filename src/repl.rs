//! Interactive session: a login prompt followed by a small command loop
//! driving the dashboard controller.

use crate::api::PortfolioApi;
use crate::cli::{is_valid_symbol, OutputFormat};
use crate::config::DisplayConfig;
use crate::dashboard::{Dashboard, Tab};
use crate::models::LoginForm;
use crate::report::{self, progress};
use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::debug;

const PROMPT: &str = "portfolio> ";

const HELP: &str = "\
Commands:
  tab <name>          overview, holdings, dividends, orders, stock-analysis
  expand <SYMBOL>     show or hide a holding's details
  analyze <SYMBOL>    trading history for one holding
  back                return from the analysis to holdings
  orders all          toggle the full order history
  dividends all       toggle the full dividend history
  summary             toggle account balances under the summary
  collapse            collapse everything
  refresh             reload all portfolio data
  clear-cache         clear the backend cache and reload
  clear-session       clear the backend session
  logout              log out and return to the login prompt
  help                this text
  quit                leave";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Blank line: redraw the current screen.
    Show,
    Tab(Tab),
    Expand(String),
    Analyze(String),
    Back,
    OrdersAll,
    DividendsAll,
    Summary,
    Collapse,
    Refresh,
    ClearCache,
    ClearSession,
    Logout,
    Help,
    Quit,
}

fn symbol(raw: &str) -> Result<String, String> {
    if is_valid_symbol(raw) {
        Ok(raw.trim().to_uppercase())
    } else {
        Err(format!("Invalid ticker symbol: {}", raw))
    }
}

/// Parse one input line.
pub fn parse(line: &str) -> Result<ReplCommand, String> {
    let mut words = line.split_whitespace();
    let head = match words.next() {
        Some(word) => word.to_lowercase(),
        None => return Ok(ReplCommand::Show),
    };
    let arg = words.next();
    if words.next().is_some() {
        return Err(format!("Too many arguments for `{}`", head));
    }

    match (head.as_str(), arg) {
        ("tab", Some(name)) => name.parse().map(ReplCommand::Tab),
        ("tab", None) => {
            Err("Usage: tab <overview|holdings|dividends|orders|stock-analysis>".to_string())
        }
        ("orders", Some(all)) if all.eq_ignore_ascii_case("all") => Ok(ReplCommand::OrdersAll),
        ("dividends", Some(all)) if all.eq_ignore_ascii_case("all") => {
            Ok(ReplCommand::DividendsAll)
        }
        ("overview" | "holdings" | "dividends" | "orders", None) => {
            head.parse().map(ReplCommand::Tab)
        }
        ("expand", Some(raw)) => symbol(raw).map(ReplCommand::Expand),
        ("analyze" | "analyse" | "stock", Some(raw)) => symbol(raw).map(ReplCommand::Analyze),
        ("expand" | "analyze" | "analyse" | "stock", None) => {
            Err(format!("Usage: {} <SYMBOL>", head))
        }
        ("back", None) => Ok(ReplCommand::Back),
        ("summary", None) => Ok(ReplCommand::Summary),
        ("collapse", None) => Ok(ReplCommand::Collapse),
        ("refresh" | "retry", None) => Ok(ReplCommand::Refresh),
        ("clear-cache", None) => Ok(ReplCommand::ClearCache),
        ("clear-session", None) => Ok(ReplCommand::ClearSession),
        ("logout", None) => Ok(ReplCommand::Logout),
        ("help" | "?", None) => Ok(ReplCommand::Help),
        ("quit" | "exit" | "q", None) => Ok(ReplCommand::Quit),
        _ => Err(format!("Unknown command: {} (type `help`)", line.trim())),
    }
}

/// Rendering options for the session.
#[derive(Debug, Clone, Copy)]
pub struct ReplOptions<'a> {
    pub display: &'a DisplayConfig,
    pub format: OutputFormat,
    pub spinner: bool,
}

enum Flow {
    Continue,
    LoggedOut,
    Quit,
}

/// Run the session until `quit` or end of input.
pub async fn run<A, R, W>(
    dashboard: &mut Dashboard<A>,
    input: R,
    out: &mut W,
    options: &ReplOptions<'_>,
) -> Result<()>
where
    A: PortfolioApi,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    if !login(dashboard, &mut lines, out, options).await? {
        return Ok(());
    }
    writeln!(out, "Type `help` for commands.")?;

    loop {
        let line = match prompt(&mut lines, out, PROMPT).await? {
            Some(line) => line,
            None => break,
        };

        let command = match parse(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "⚠️  {}", message)?;
                continue;
            }
        };
        debug!("REPL command: {:?}", command);

        match execute(dashboard, command, out, options).await? {
            Flow::Continue => {}
            Flow::Quit => break,
            Flow::LoggedOut => {
                if !login(dashboard, &mut lines, out, options).await? {
                    break;
                }
            }
        }
    }

    Ok(())
}

async fn prompt<R, W>(lines: &mut Lines<R>, out: &mut W, label: &str) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(out, "{}", label)?;
    out.flush()?;
    lines.next_line().await.context("Failed to read input")
}

fn show<A: PortfolioApi, W: Write>(
    dashboard: &Dashboard<A>,
    out: &mut W,
    options: &ReplOptions<'_>,
) -> Result<()> {
    let screen = report::render_screen(dashboard, options.display, options.format)?;
    writeln!(out, "{}", screen)?;
    Ok(())
}

/// Prompt for credentials until login succeeds. `false` means input ended.
async fn login<A, R, W>(
    dashboard: &mut Dashboard<A>,
    lines: &mut Lines<R>,
    out: &mut W,
    options: &ReplOptions<'_>,
) -> Result<bool>
where
    A: PortfolioApi,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    loop {
        show(dashboard, out, options)?;

        let Some(username) = prompt(lines, out, "Username: ").await? else {
            return Ok(false);
        };
        let Some(password) = prompt(lines, out, "Password: ").await? else {
            return Ok(false);
        };
        let Some(mfa_code) = prompt(lines, out, "MFA code (blank if none): ").await? else {
            return Ok(false);
        };

        let form = LoginForm::new(username, password, mfa_code);
        let pb = progress::spinner("Signing in and loading portfolio...", options.spinner);
        let outcome = dashboard.login(&form).await;
        progress::finish(pb);

        if outcome.is_success() {
            options.display.apply_to(dashboard.view_mut());
            show(dashboard, out, options)?;
            return Ok(true);
        }
    }
}

async fn execute<A: PortfolioApi, W: Write>(
    dashboard: &mut Dashboard<A>,
    command: ReplCommand,
    out: &mut W,
    options: &ReplOptions<'_>,
) -> Result<Flow> {
    match command {
        ReplCommand::Show => {}
        ReplCommand::Tab(tab) => dashboard.change_tab(tab),
        ReplCommand::Expand(symbol) => {
            dashboard.view_mut().toggle_holding(&symbol);
            dashboard.change_tab(Tab::Holdings);
        }
        ReplCommand::Analyze(symbol) => {
            let pb = progress::spinner(&format!("Analyzing {}...", symbol), options.spinner);
            dashboard.select_stock(&symbol).await;
            progress::finish(pb);
        }
        ReplCommand::Back => dashboard.back_to_holdings(),
        ReplCommand::OrdersAll => {
            dashboard.view_mut().toggle_show_all_orders();
            dashboard.change_tab(Tab::Orders);
        }
        ReplCommand::DividendsAll => {
            dashboard.view_mut().toggle_show_all_dividends();
            dashboard.change_tab(Tab::Dividends);
        }
        ReplCommand::Summary => dashboard.view_mut().toggle_summary(),
        ReplCommand::Collapse => dashboard.view_mut().collapse_all(),
        ReplCommand::Refresh => {
            let pb = progress::spinner("Loading portfolio data...", options.spinner);
            dashboard.refresh().await;
            progress::finish(pb);
        }
        ReplCommand::ClearCache => {
            let pb = progress::spinner("Clearing cache and reloading...", options.spinner);
            let outcome = dashboard.clear_cache().await;
            progress::finish(pb);
            write!(
                out,
                "{}",
                report::render_action("Clear cache", &outcome, options.format)?
            )?;
        }
        ReplCommand::ClearSession => {
            let outcome = dashboard.clear_session().await;
            write!(
                out,
                "{}",
                report::render_action("Clear session", &outcome, options.format)?
            )?;
        }
        ReplCommand::Logout => {
            let outcome = dashboard.logout().await;
            write!(
                out,
                "{}",
                report::render_action("Logout", &outcome, options.format)?
            )?;
            return Ok(Flow::LoggedOut);
        }
        ReplCommand::Help => {
            writeln!(out, "{}", HELP)?;
            return Ok(Flow::Continue);
        }
        ReplCommand::Quit => return Ok(Flow::Quit),
    }

    show(dashboard, out, options)?;
    Ok(Flow::Continue)
}
