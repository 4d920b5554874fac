//! Command implementations

pub mod build;

pub mod doctor;

pub mod info;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Start a stderr spinner with `message`.
///
/// indicatif hides the spinner when stderr is not a terminal, so this is
/// safe to call in CI.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
