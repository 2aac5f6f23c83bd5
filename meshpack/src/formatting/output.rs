//! Key/value lines and the closing run summary.

use std::fmt::Display;
use std::time::Duration;

use meshpack_core::RunReport;
use owo_colors::OwoColorize;

const RULE_WIDTH: usize = 60;

pub fn print_key_value(key: &str, value: impl Display) {
    println!(
        "  {} {}",
        format!("{:<9}", key).bright_black().bold(),
        value.to_string().bold()
    );
}

/// Boxed totals printed after the outcome table.
pub fn print_run_summary(report: &RunReport, total: Duration) {
    let rows = [
        ("Task", report.task.clone()),
        ("Packages", report.len().to_string()),
        ("Duration", format_duration(total)),
        ("Succeeded", report.succeeded().len().to_string()),
        ("Failed", report.failed().len().to_string()),
        ("Skipped", report.skipped().len().to_string()),
    ];

    println!("\n{}\n", "─".repeat(RULE_WIDTH).bright_black());
    println!(
        "┌─ {} {}",
        "Summary".cyan().bold(),
        "─".repeat(RULE_WIDTH - 11).bright_black()
    );
    for (key, value) in &rows {
        println!(
            "│ {} {}",
            format!("{:<9}", key).bright_black().bold(),
            value.bold()
        );
    }
    println!("└{}", "─".repeat(RULE_WIDTH).bright_black());
}

pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs == 0 {
        format!("{}ms", elapsed.as_millis())
    } else if secs < 60 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::format_duration;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_millis(61_900)), "1m 01s");
    }
}
