//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::dashboard::Tab;
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Portfolio Analyzer - terminal dashboard for a brokerage portfolio backend
///
/// Logs in to the portfolio API, loads summary, holdings, dividends, orders,
/// account and user data in one concurrent batch, and renders the dashboard
/// as text or JSON.
///
/// Examples:
///   portfolio-analyzer login -u me@example.com --mfa 123456
///   portfolio-analyzer dashboard --tab holdings --expand AAPL
///   portfolio-analyzer stock MSFT --format json
///   portfolio-analyzer interactive
///   portfolio-analyzer --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Base URL of the portfolio backend
    ///
    /// Defaults to the config file value, then http://localhost:8000.
    #[arg(long, global = true, value_name = "URL", env = "PORTFOLIO_API_URL")]
    pub api_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .portfolio-analyzer.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, global = true, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the rendered output to a file instead of stdout
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .portfolio-analyzer.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log in and show the dashboard
    Login {
        /// Username or email
        #[arg(short, long)]
        username: String,

        /// Password; prompted for when absent
        #[arg(short, long, env = "PORTFOLIO_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Multi-factor authentication code
        #[arg(long, value_name = "CODE")]
        mfa: Option<String>,
    },

    /// End the backend session
    Logout,

    /// Clear the backend's stored session
    ClearSession,

    /// Clear the backend's data cache
    ClearCache,

    /// Check that the backend is reachable
    Health,

    /// Show the dashboard for the current backend session
    Dashboard(DashboardArgs),

    /// Show the trading analysis for one symbol
    Stock {
        /// Ticker symbol, e.g. AAPL
        symbol: String,
    },

    /// Start an interactive session
    Interactive,
}

#[derive(ClapArgs, Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardArgs {
    /// Tab to show
    #[arg(long, value_name = "TAB", default_value = "overview")]
    pub tab: Tab,

    /// Expand a holding's details (repeatable)
    #[arg(long, value_name = "SYMBOL")]
    pub expand: Vec<String>,

    /// List every order instead of the most recent ones
    #[arg(long)]
    pub all_orders: bool,

    /// List every dividend instead of the most recent ones
    #[arg(long)]
    pub all_dividends: bool,

    /// Expand the summary with account details
    #[arg(long)]
    pub summary: bool,
}

/// Output format for rendered screens.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text (default)
    #[default]
    Text,
    /// JSON snapshot
    Json,
}

impl Command {
    /// Subcommand name as typed, for logging without arguments.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Login { .. } => "login",
            Command::Logout => "logout",
            Command::ClearSession => "clear-session",
            Command::ClearCache => "clear-cache",
            Command::Health => "health",
            Command::Dashboard(_) => "dashboard",
            Command::Stock { .. } => "stock",
            Command::Interactive => "interactive",
        }
    }
}

/// Ticker symbols are letters and digits with optional `.` or `-` class suffixes.
///
/// At least one letter or digit is required so `.` and `..` never reach a URL path.
pub fn is_valid_symbol(symbol: &str) -> bool {
    let symbol = symbol.trim();
    symbol.len() <= 12
        && symbol.chars().any(|c| c.is_ascii_alphanumeric())
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let command = match &self.command {
            Some(command) => command,
            None => return Err("A subcommand is required (try --help)".to_string()),
        };

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match command {
            Command::Login { username, .. } if username.trim().is_empty() => {
                Err("Username must not be empty".to_string())
            }
            Command::Stock { symbol } if !is_valid_symbol(symbol) => {
                Err(format!("Invalid ticker symbol: {}", symbol))
            }
            Command::Dashboard(dashboard) => {
                match dashboard.expand.iter().find(|s| !is_valid_symbol(s)) {
                    Some(bad) => Err(format!("Invalid ticker symbol: {}", bad)),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
