//! Screen rendering.
//!
//! Text and JSON output for every dashboard screen, plus the number and
//! date formatting they share.

pub mod format;
pub mod generator;
pub mod progress;

pub use generator::*;
