//! Derived figures for the dashboard views.
//!
//! Everything here is a pure function over the fetched snapshots; nothing
//! talks to the backend.

pub mod aggregator;

pub use aggregator::*;
