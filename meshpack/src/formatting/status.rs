//! Status symbols shared by message lines and the outcome table.

use comfy_table::Color;
use meshpack_core::Outcome;
use owo_colors::OwoColorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
    Warning,
}

impl Status {
    pub fn of(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Succeeded => Status::Success,
            Outcome::Failed(_) => Status::Failure,
            Outcome::Skipped(_) => Status::Warning,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Status::Success => "✓",
            Status::Failure => "✗",
            Status::Warning => "⚠",
        }
    }

    /// Cell colour in the outcome table.
    pub fn table_color(self) -> Color {
        match self {
            Status::Success => Color::Green,
            Status::Failure => Color::Red,
            Status::Warning => Color::Yellow,
        }
    }

    fn paint(self, text: &str) -> String {
        match self {
            Status::Success => text.green().bold().to_string(),
            Status::Failure => text.red().bold().to_string(),
            Status::Warning => text.yellow().bold().to_string(),
        }
    }
}

fn print_status(status: Status, message: &str) {
    println!("  {} {}", status.paint(status.symbol()), status.paint(message));
}

pub fn print_success(message: &str) {
    print_status(Status::Success, message);
}

pub fn print_warning(message: &str) {
    print_status(Status::Warning, message);
}
