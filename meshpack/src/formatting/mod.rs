//! Terminal output shared by the commands.

mod headers;
mod output;
mod progress;
mod status;
mod tables;

pub use headers::{print_section_header, SectionStyle};
pub use output::{print_key_value, print_run_summary};
pub use progress::create_progress_bar;
pub use status::{print_success, print_warning};
pub use tables::{print_outcome_table, print_package_list};
