//! Discovery and inspection commands.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use meshpack_core::{select, Package, TaskEnvironment, TaskRunner};
use meshpack_tasks::ListTask;
use owo_colors::OwoColorize;

use crate::formatting::{print_package_list, print_section_header, print_warning, SectionStyle};
use crate::WorkspaceArgs;

use super::Workspace;

pub fn cmd_graph(args: &WorkspaceArgs, json: bool) -> Result<()> {
    let ws = Workspace::load(args)?;
    let order = ws.graph.topological_order()?;

    if json {
        let edges: serde_json::Map<String, serde_json::Value> = ws
            .graph
            .packages()
            .map(|p| (p.name.clone(), serde_json::json!(p.local_dependencies)))
            .collect();
        let graph_data = serde_json::json!({
            "packages": order,
            "edges": edges,
        });
        println!("{}", serde_json::to_string_pretty(&graph_data)?);
        return Ok(());
    }

    print_section_header("Dependency Graph", SectionStyle::Primary);

    if order.is_empty() {
        print_warning("No packages found");
    } else {
        println!(
            "  {} Topological order ({} packages):",
            "OK".green(),
            order.len().to_string().bold().cyan()
        );
        println!();
        for (idx, name) in order.iter().enumerate() {
            let deps = ws.graph.dependencies(name)?;
            let deps_str = if deps.is_empty() {
                String::new()
            } else {
                format!("← {}", deps.join(", "))
            };
            println!(
                "  {} {} {}",
                format!("{:2}", idx + 1).bright_black(),
                name.bold().white(),
                deps_str.bright_black()
            );
        }
    }
    println!();

    Ok(())
}

/// Lists the selected packages. The plain listing goes through the task
/// runner one package at a time, so it comes out in dependency order.
pub fn cmd_list(args: &WorkspaceArgs, json: bool) -> Result<()> {
    let ws = Workspace::load(args)?;
    let filter = ws.filter(args)?;
    let selection = select(&ws.graph, &filter, |_| true)?;

    if json {
        ws.graph.check_acyclic_within(|name| selection.contains(name))?;
        let packages: Vec<&Package> = selection.packages().to_vec();
        println!("{}", serde_json::to_string_pretty(&packages)?);
        return Ok(());
    }

    let listed: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&listed);
    let env = TaskEnvironment::new(&ws.packages_dir).with_output_handler(move |_, name, _| {
        if let Ok(mut names) = sink.lock() {
            names.push(name.to_string());
        }
    });

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    rt.block_on(
        TaskRunner::new()
            .with_concurrency(1)
            .run(&ws.graph, &selection, Arc::new(ListTask), env),
    )?;

    let names = listed
        .lock()
        .map(|names| names.clone())
        .unwrap_or_default();
    print_section_header(
        &format!("Packages ({})", names.len()),
        SectionStyle::Primary,
    );
    print_package_list(&names);
    println!();

    Ok(())
}
