//! Outcome table and package lists.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use meshpack_core::{Outcome, RunReport};
use owo_colors::OwoColorize;

use super::status::Status;

/// One row per selected package, in dispatch order; packages that never
/// started follow in name order.
pub fn print_outcome_table(report: &RunReport) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("").add_attribute(Attribute::Bold),
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Details").add_attribute(Attribute::Bold),
        ]);

    let never_started = report
        .outcomes
        .keys()
        .filter(|name| !report.dispatch_order.contains(*name));
    for name in report.dispatch_order.iter().chain(never_started) {
        let Some(outcome) = report.outcome(name) else {
            continue;
        };
        let status = Status::of(outcome);
        let details = match outcome {
            Outcome::Succeeded => String::new(),
            Outcome::Failed(message) => message.trim().to_string(),
            Outcome::Skipped(reason) => format!("skipped: {}", reason),
        };
        table.add_row(vec![
            Cell::new(status.symbol()).fg(status.table_color()),
            Cell::new(name).fg(status.table_color()),
            Cell::new(details),
        ]);
    }

    println!("{}", table);
}

pub fn print_package_list(packages: &[String]) {
    if packages.is_empty() {
        println!("  {}", "(none)".bright_black());
    }
    for (idx, name) in packages.iter().enumerate() {
        println!("  {} {}", format!("{:>3}.", idx + 1).bright_black(), name.bold());
    }
}
