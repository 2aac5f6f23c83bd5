//! Section titles.

use meshpack_core::RunReport;
use owo_colors::OwoColorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionStyle {
    Primary,
    Success,
    Warning,
    Error,
}

impl SectionStyle {
    /// Red when anything failed, yellow when anything was only skipped.
    pub fn for_report(report: &RunReport) -> Self {
        if !report.failed().is_empty() {
            SectionStyle::Error
        } else if !report.skipped().is_empty() {
            SectionStyle::Warning
        } else {
            SectionStyle::Success
        }
    }
}

pub fn print_section_header(title: &str, style: SectionStyle) {
    let title = match style {
        SectionStyle::Primary => title.cyan().bold().to_string(),
        SectionStyle::Success => title.green().bold().to_string(),
        SectionStyle::Warning => title.yellow().bold().to_string(),
        SectionStyle::Error => title.red().bold().to_string(),
    };
    println!("{}\n", title);
}
