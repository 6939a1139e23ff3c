//! Portfolio Analyzer - terminal dashboard for a brokerage portfolio backend
//!
//! A CLI client that logs in to the portfolio REST API, loads the whole
//! portfolio in one concurrent batch and renders it as text or JSON.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad config, connection failure, invalid arguments)
//!   2 - The backend reported a failure (login rejected, data unavailable)

mod analysis;
mod api;
mod cli;
mod config;
mod dashboard;
mod models;
mod repl;
mod report;

use anyhow::{Context, Result};
use api::{ApiClient, ApiOutcome, PortfolioApi};
use cli::{Args, Command, DashboardArgs, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use dashboard::{Dashboard, Screen};
use models::LoginForm;
use report::progress;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so `[general] verbose` applies
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(log_level(&args, &config));

    info!("Portfolio Analyzer v{}", env!("CARGO_PKG_VERSION"));
    match source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .portfolio-analyzer.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml()?;
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to set the backend URL, timeouts and list lengths.");
    Ok(())
}

/// `--quiet` wins, then `--verbose` or `[general] verbose`.
fn log_level(args: &Args, config: &Config) -> tracing::Level {
    if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    }
}

/// Initialize logging on stderr so rendered output on stdout stays clean.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    Ok(match Config::load_default()? {
        Some(config) => (config, Some(PathBuf::from(DEFAULT_CONFIG_FILE))),
        None => (Config::default(), None),
    })
}

/// Where rendered output goes.
struct Output {
    format: OutputFormat,
    path: Option<PathBuf>,
    spinner: bool,
}

impl Output {
    fn emit(&self, content: &str) -> Result<()> {
        match &self.path {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("Failed to write output to {}", path.display()))?;
                eprintln!("✅ Saved to {}", path.display());
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", content.trim_end())?;
            }
        }
        Ok(())
    }
}

/// Run the requested command. Returns the process exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    let command = args
        .command
        .clone()
        .context("A subcommand is required (try --help)")?;
    debug!("Command: {}", command.name());

    let client =
        ApiClient::new(config.api.client_config()).context("Invalid API configuration")?;
    info!("Using backend at {}", client.base_url());

    let output = Output {
        format: config.general.format,
        path: args.output.clone(),
        spinner: config.general.format == OutputFormat::Text && !args.quiet,
    };
    let mut dashboard = Dashboard::new(client);

    match command {
        Command::Login {
            username,
            password,
            mfa,
        } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            let form = LoginForm::new(username, password, mfa.unwrap_or_default());
            login(&mut dashboard, &form, &config, &output).await
        }
        Command::Logout => {
            let outcome = dashboard.logout().await;
            report_action("Logout", &outcome, &output)
        }
        Command::ClearSession => {
            let outcome = dashboard.clear_session().await;
            report_action("Clear session", &outcome, &output)
        }
        Command::ClearCache => {
            dashboard.resume_session();
            let pb = progress::spinner("Clearing cache and reloading...", output.spinner);
            let outcome = dashboard.clear_cache().await;
            progress::finish(pb);
            report_action("Clear cache", &outcome, &output)
        }
        Command::Health => health(dashboard.api(), &output).await,
        Command::Dashboard(view_args) => {
            show_dashboard(&mut dashboard, &view_args, &config, &output).await
        }
        Command::Stock { symbol } => show_stock(&mut dashboard, &symbol, &config, &output).await,
        Command::Interactive => {
            let options = repl::ReplOptions {
                display: &config.display,
                format: output.format,
                spinner: output.spinner,
            };
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            repl::run(&mut dashboard, stdin, &mut stdout, &options).await?;
            Ok(0)
        }
    }
}

/// Read a password from stdin when it was not given on the command line.
fn read_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;

    let mut password = String::new();
    std::io::stdin()
        .read_line(&mut password)
        .context("Failed to read password")?;
    Ok(password.trim_end_matches(['\r', '\n']).to_string())
}

fn screen_exit_code<A: PortfolioApi>(dashboard: &Dashboard<A>) -> i32 {
    match dashboard.screen() {
        Screen::Ready => 0,
        Screen::Login { .. } | Screen::Error { .. } | Screen::Loading => 2,
    }
}

async fn login<A: PortfolioApi>(
    dashboard: &mut Dashboard<A>,
    form: &LoginForm,
    config: &Config,
    output: &Output,
) -> Result<i32> {
    let pb = progress::spinner("Signing in and loading portfolio...", output.spinner);
    let outcome = dashboard.login(form).await;
    progress::finish(pb);

    if outcome.is_success() {
        config.display.apply_to(dashboard.view_mut());
    }
    output.emit(&report::render_screen(dashboard, &config.display, output.format)?)?;

    Ok(screen_exit_code(dashboard))
}

fn report_action(action: &str, outcome: &ApiOutcome<()>, output: &Output) -> Result<i32> {
    output.emit(&report::render_action(action, outcome, output.format)?)?;
    Ok(if outcome.is_success() { 0 } else { 2 })
}

async fn health<A: PortfolioApi>(api: &A, output: &Output) -> Result<i32> {
    let status = api.health().await.context("Backend is unreachable")?;

    let rendered = match output.format {
        OutputFormat::Json => serde_json::to_string_pretty(&status)?,
        OutputFormat::Text => format!("✅ Backend status: {}", status.status),
    };
    output.emit(&rendered)?;
    Ok(0)
}

async fn show_dashboard<A: PortfolioApi>(
    dashboard: &mut Dashboard<A>,
    view_args: &DashboardArgs,
    config: &Config,
    output: &Output,
) -> Result<i32> {
    dashboard.resume_session();

    let view = dashboard.view_mut();
    config.display.apply_to(view);
    view.change_tab(view_args.tab);
    for symbol in &view_args.expand {
        view.toggle_holding(&symbol.trim().to_uppercase());
    }
    if view_args.all_orders {
        view.show_all_orders = true;
    }
    if view_args.all_dividends {
        view.show_all_dividends = true;
    }
    view.summary_expanded = view_args.summary;

    let pb = progress::spinner("Loading portfolio data...", output.spinner);
    dashboard.refresh().await;
    progress::finish(pb);

    output.emit(&report::render_screen(dashboard, &config.display, output.format)?)?;
    Ok(screen_exit_code(dashboard))
}

async fn show_stock<A: PortfolioApi>(
    dashboard: &mut Dashboard<A>,
    symbol: &str,
    config: &Config,
    output: &Output,
) -> Result<i32> {
    dashboard.resume_session();

    let pb = progress::spinner(&format!("Analyzing {}...", symbol), output.spinner);
    let found = dashboard.select_stock(symbol).await;
    progress::finish(pb);

    output.emit(&report::render_screen(dashboard, &config.display, output.format)?)?;
    Ok(if found { 0 } else { 2 })
}
