//! Task execution commands.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use indicatif::ProgressBar;
use meshpack_core::{select, Package, PackageTask, RunReport, TaskEnvironment, TaskRunner};
use meshpack_tasks::{ExecTask, InstallTask, RunScriptTask};
use owo_colors::OwoColorize;
use tracing::{info, warn};

use crate::formatting::{
    create_progress_bar, print_outcome_table, print_run_summary, print_section_header,
    print_success, print_warning, SectionStyle,
};
use crate::WorkspaceArgs;

use super::Workspace;

/// Advances the progress bar once the wrapped task finishes a package.
struct ProgressTask {
    inner: Arc<dyn PackageTask>,
    progress: ProgressBar,
}

#[async_trait]
impl PackageTask for ProgressTask {
    fn describe(&self) -> String {
        self.inner.describe()
    }

    async fn execute(&self, package: &Package, env: &TaskEnvironment) -> meshpack_core::Result<()> {
        self.progress.set_message(package.name.clone());
        let result = self.inner.execute(package, env).await;
        self.progress.inc(1);
        result
    }
}

fn link_workspace(ws: &Workspace, phase: &str) -> Result<()> {
    let summary = ws
        .linker()
        .link_all(&ws.graph)
        .with_context(|| format!("Failed to link packages ({})", phase))?;
    info!(phase, links = summary.links, shims = summary.shims, "linked local packages");
    Ok(())
}

fn run_task<B, F>(
    args: &WorkspaceArgs,
    build: B,
    post_filter: F,
    title: &str,
    empty_message: &str,
) -> Result<()>
where
    B: FnOnce(&Workspace) -> Arc<dyn PackageTask>,
    F: Fn(&Package) -> bool,
{
    let start = Instant::now();
    let ws = Workspace::load(args)?;
    let task = build(&ws);
    let filter = ws.filter(args)?;
    let selection = select(&ws.graph, &filter, post_filter)?;

    print_section_header(title, SectionStyle::Primary);

    if selection.is_empty() {
        print_warning(empty_message);
        println!();
        return Ok(());
    }

    if !args.no_link {
        link_workspace(&ws, "before run")?;
    }

    let runner = TaskRunner::new()
        .with_max_parallel(ws.concurrency(args))
        .with_bail(ws.bail(args));
    let abort = runner.abort_handle();
    if let Err(e) = ctrlc::set_handler(move || abort.abort()) {
        warn!(error = %e, "failed to install Ctrl-C handler");
    }

    let pb = create_progress_bar(selection.len() as u64);
    let printer = pb.clone();
    let env = TaskEnvironment::new(&ws.packages_dir)
        .with_bin_dir(ws.bin_dir())
        .with_output_handler(move |package, line, is_stderr| {
            let prefix = format!("[{}]", package);
            printer.suspend(|| {
                if is_stderr {
                    eprintln!("  {} {}", prefix.bright_black().bold(), line.bright_red());
                } else {
                    println!("  {} {}", prefix.bright_black().bold(), line);
                }
            });
        });
    let task: Arc<dyn PackageTask> = Arc::new(ProgressTask {
        inner: task,
        progress: pb.clone(),
    });

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let report = rt.block_on(runner.run(&ws.graph, &selection, task, env))?;
    pb.finish_and_clear();

    if !args.no_link {
        link_workspace(&ws, "after run")?;
    }

    print_report(&report);
    print_run_summary(&report, start.elapsed());
    println!();

    if !report.success() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    print_section_header("Results", SectionStyle::for_report(report));
    print_outcome_table(report);
    println!();

    if report.failed().is_empty() && report.skipped().is_empty() {
        print_success(&format!("All {} packages succeeded", report.len()));
    } else {
        print_warning(&format!(
            "{} succeeded, {} failed, {} skipped",
            report.succeeded().len(),
            report.failed().len(),
            report.skipped().len()
        ));
    }
}

pub fn cmd_install(args: &WorkspaceArgs, extra: Vec<String>) -> Result<()> {
    run_task(
        args,
        |ws| Arc::new(InstallTask::new(ws.client(args), extra)),
        |_| true,
        "Installing dependencies",
        "No packages selected; nothing to install",
    )
}

pub fn cmd_run(args: &WorkspaceArgs, script: String, extra: Vec<String>) -> Result<()> {
    let title = format!("Running script '{}'", script);
    let empty_message = format!("No selected package defines script '{}'; nothing to run", script);
    run_task(
        args,
        |ws| Arc::new(RunScriptTask::new(ws.client(args), script.as_str(), extra)),
        |package| package.has_script(&script),
        &title,
        &empty_message,
    )
}

pub fn cmd_exec(args: &WorkspaceArgs, binary: String, extra: Vec<String>) -> Result<()> {
    let title = format!("Executing '{}'", binary);
    run_task(
        args,
        |_| Arc::new(ExecTask::new(binary, extra)),
        |_| true,
        &title,
        "No packages selected; nothing to run",
    )
}
