//! Progress reporting on the commandline
//!
//! Relies on the [indicatif] crate

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{prefix:.bold} [{elapsed_precise}] {wide_bar} {pos}/{len} {msg}";

/// Returns a progress bar over `len` steps using the crate-wide style.
pub fn get_progressbar(len: u64) -> ProgressBar {
    let style = ProgressStyle::with_template(TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::new(len).with_style(style)
}
