//! Progress bars for the batch stages.

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {msg}";

/// Progress bar for `len` units of work; hidden when `enabled` is false.
pub fn progress_bar(len: u64, enabled: bool, message: &'static str) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(message);
    pb
}
