use indicatif::{ProgressBar, ProgressStyle};

/// Counts finished packages; the message names the latest one to start.
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let style = ProgressStyle::with_template(
        "{spinner:.green} {elapsed:>4} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ");
    ProgressBar::new(total).with_style(style)
}
