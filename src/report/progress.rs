//! Loading spinner shown while the dashboard batch is in flight.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Start a spinner on stderr, or nothing when output must stay quiet.
pub fn spinner(message: &str, enabled: bool) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Stop and erase a spinner started by [`spinner`].
pub fn finish(spinner: Option<ProgressBar>) {
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
}
