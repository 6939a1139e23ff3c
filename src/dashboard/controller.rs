//! The top-level dashboard controller.
//!
//! [`Dashboard`] owns the API handle, the fetched data and the view state,
//! and exposes one method per user action. Renderers only read from it.

use crate::api::client::outcome_or_message;
use crate::api::{ApiOutcome, PortfolioApi};
use crate::dashboard::data::PortfolioData;
use crate::dashboard::state::{Tab, ViewState};
use crate::models::LoginForm;
use tracing::{debug, info, warn};

/// Shown when the backend cannot be reached at all.
pub const CONNECTION_ERROR_MESSAGE: &str =
    "Connection error. Please make sure the backend server is running.";

/// What the user should currently be looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// The login form, with the last rejection message if any.
    Login { notice: Option<String> },
    /// A fetch is in flight.
    Loading,
    /// The page-level error view with a retry control.
    Error { message: String },
    /// The dashboard with its sections.
    Ready,
}

/// Top-level controller over a [`PortfolioApi`].
pub struct Dashboard<A> {
    api: A,
    logged_in: bool,
    login_notice: Option<String>,
    data: PortfolioData,
    view: ViewState,
}

impl<A: PortfolioApi> Dashboard<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            logged_in: false,
            login_notice: None,
            data: PortfolioData::default(),
            view: ViewState::default(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn data(&self) -> &PortfolioData {
        &self.data
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn screen(&self) -> Screen {
        if !self.is_logged_in() {
            return Screen::Login {
                notice: self.login_notice.clone(),
            };
        }
        if self.data.loading {
            return Screen::Loading;
        }
        match &self.data.error {
            Some(message) => Screen::Error {
                message: message.clone(),
            },
            None => Screen::Ready,
        }
    }

    /// Submit the login form. On success the dashboard data is fetched.
    pub async fn login(&mut self, form: &LoginForm) -> ApiOutcome<()> {
        if let Err(message) = form.validate() {
            debug!("Login form rejected locally: {}", message);
            self.login_notice = Some(message.clone());
            return ApiOutcome::Failure(message);
        }

        info!("Logging in as {}", form.username.trim());
        let outcome = outcome_or_message(
            self.api.login(&form.to_request()).await,
            CONNECTION_ERROR_MESSAGE,
        );

        match &outcome {
            ApiOutcome::Success(()) => {
                self.start_session();
                self.refresh().await;
            }
            ApiOutcome::Failure(message) => {
                warn!("Login failed: {}", message);
                self.logged_in = false;
                self.login_notice = Some(message.clone());
            }
        }

        outcome
    }

    /// Treat the backend session as already established (one-shot commands).
    pub fn resume_session(&mut self) {
        self.start_session();
    }

    fn start_session(&mut self) {
        self.logged_in = true;
        self.login_notice = None;
        self.data.clear();
        self.view.reset();
    }

    /// Log out on the backend and wipe all local state.
    pub async fn logout(&mut self) -> ApiOutcome<()> {
        info!("Logging out");
        let outcome = outcome_or_message(self.api.logout().await, CONNECTION_ERROR_MESSAGE);
        if let ApiOutcome::Failure(message) = &outcome {
            warn!("Backend logout failed: {}", message);
        }

        self.data.clear();
        self.view.reset();
        self.logged_in = false;
        self.login_notice = None;
        outcome
    }

    /// Re-run the dashboard fan-out. Also serves as the error view's retry.
    pub async fn refresh(&mut self) {
        self.data.fetch_all(&self.api).await;
    }

    /// Clear the backend cache, drop local data and fetch again.
    pub async fn clear_cache(&mut self) -> ApiOutcome<()> {
        info!("Clearing backend cache");
        let outcome = outcome_or_message(self.api.clear_cache().await, CONNECTION_ERROR_MESSAGE);
        if let ApiOutcome::Failure(message) = &outcome {
            warn!("Cache clear failed: {}", message);
        }

        self.data.clear();
        self.refresh().await;
        outcome
    }

    /// Clear the backend session, drop local data and reset the view.
    pub async fn clear_session(&mut self) -> ApiOutcome<()> {
        info!("Clearing backend session");
        let outcome =
            outcome_or_message(self.api.clear_session().await, CONNECTION_ERROR_MESSAGE);
        if let ApiOutcome::Failure(message) = &outcome {
            warn!("Session clear failed: {}", message);
        }

        self.data.clear();
        self.view.reset();
        outcome
    }

    pub fn change_tab(&mut self, tab: Tab) {
        debug!("Switching to tab {}", tab);
        self.view.change_tab(tab);
    }

    /// Inspect a holding: fetch its analysis and switch to the analysis view.
    pub async fn select_stock(&mut self, symbol: &str) -> bool {
        let symbol = symbol.trim().to_uppercase();
        self.view.open_stock_analysis();
        self.data.fetch_stock_analysis(&self.api, &symbol).await
    }

    /// Discard the per-symbol analysis and return to the holdings list.
    pub fn back_to_holdings(&mut self) {
        self.data.clear_stock_analysis();
        self.view.back_to_holdings();
    }
}
