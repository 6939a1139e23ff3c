//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.portfolio-analyzer.toml` files.

use crate::api::ClientConfig;
use crate::cli::OutputFormat;
use crate::dashboard::ViewState;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".portfolio-analyzer.toml";

/// Fallback environment variable for the API base URL.
pub const LEGACY_API_URL_ENV: &str = "NEXT_PUBLIC_API_URL";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Backend connection settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// List lengths and default expansion flags.
    #[serde(default)]
    pub display: DisplayConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Default output format.
    #[serde(default)]
    pub format: OutputFormat,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the portfolio backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout. Unset means no client-side timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_user_agent() -> String {
    format!("portfolio-analyzer/{}", env!("CARGO_PKG_VERSION"))
}

impl ApiConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout_seconds: self.timeout_seconds,
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Dashboard display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Orders listed before "show all".
    #[serde(default = "default_orders_preview")]
    pub orders_preview: usize,

    /// Dividends listed before "show all".
    #[serde(default = "default_dividends_preview")]
    pub dividends_preview: usize,

    /// Orders and dividends listed in a stock analysis.
    #[serde(default = "default_analysis_preview")]
    pub analysis_preview: usize,

    /// Start with every order listed.
    #[serde(default)]
    pub show_all_orders: bool,

    /// Start with every dividend listed.
    #[serde(default)]
    pub show_all_dividends: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            orders_preview: default_orders_preview(),
            dividends_preview: default_dividends_preview(),
            analysis_preview: default_analysis_preview(),
            show_all_orders: false,
            show_all_dividends: false,
        }
    }
}

impl DisplayConfig {
    /// Seed a fresh view with the configured show-all defaults.
    pub fn apply_to(&self, view: &mut ViewState) {
        view.show_all_orders = self.show_all_orders;
        view.show_all_dividends = self.show_all_dividends;
    }
}

fn default_orders_preview() -> usize {
    10
}

fn default_dividends_preview() -> usize {
    5
}

fn default_analysis_preview() -> usize {
    5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.portfolio-analyzer.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and `PORTFOLIO_API_URL`, which clap folds into
    /// `--api-url`) take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        let legacy_url = std::env::var(LEGACY_API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty());
        self.merge(args, legacy_url);
    }

    fn merge(&mut self, args: &crate::cli::Args, legacy_url: Option<String>) {
        if let Some(url) = args.api_url.clone().or(legacy_url) {
            self.api.base_url = url;
        }

        if let Some(format) = args.format {
            self.general.format = format;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Config::default()).context("Failed to render default config")
    }
}
