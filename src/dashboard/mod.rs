//! Dashboard state: fetched data, view navigation and the controller tying
//! them to a [`crate::api::PortfolioApi`].

pub mod controller;
pub mod data;
pub mod state;

#[cfg(test)]
pub mod testing;

pub use controller::{Dashboard, Screen};
pub use data::PortfolioData;
pub use state::{Tab, ViewState};
