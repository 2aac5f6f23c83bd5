//! Standalone linking.

use anyhow::{Context, Result};

use crate::formatting::{print_key_value, print_section_header, print_success, SectionStyle};
use crate::WorkspaceArgs;

use super::Workspace;

pub fn cmd_link(args: &WorkspaceArgs) -> Result<()> {
    let ws = Workspace::load(args)?;

    print_section_header("Linking local packages", SectionStyle::Primary);

    let summary = ws
        .linker()
        .link_all(&ws.graph)
        .context("Failed to link packages")?;

    print_key_value("Packages", summary.packages);
    print_key_value("Links", summary.links);
    print_key_value("Shims", summary.shims);
    if summary.pruned > 0 {
        print_key_value("Pruned", summary.pruned);
    }
    println!();
    print_success("Local packages linked");
    println!();

    Ok(())
}
