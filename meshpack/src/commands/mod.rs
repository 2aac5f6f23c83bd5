//! Command implementations for the CLI.

mod discovery;
mod execution;
mod link;

use std::path::PathBuf;

use anyhow::{Context, Result};
use meshpack_core::config::DEFAULT_PACKAGES_DIR;
use meshpack_core::linker::{Linker, DEFAULT_BIN_DIR, DEFAULT_MODULES_DIR};
use meshpack_core::{PackageGraph, Scanner, SelectionFilter, WorkspaceConfig};
use tracing::debug;

use crate::WorkspaceArgs;

pub use discovery::{cmd_graph, cmd_list};
pub use execution::{cmd_exec, cmd_install, cmd_run};
pub use link::cmd_link;

/// A scanned workspace plus the settings resolved from flags and config.
struct Workspace {
    config: WorkspaceConfig,
    packages_dir: PathBuf,
    graph: PackageGraph,
}

impl Workspace {
    /// Flags win over `meshpack.toml`, which wins over defaults.
    fn load(args: &WorkspaceArgs) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let config = WorkspaceConfig::discover(&cwd)?.unwrap_or_default();

        let packages_dir = match &args.packages_dir {
            Some(dir) => dir.clone(),
            None => config.resolved_packages_dir().unwrap_or_else(|| {
                config.root().unwrap_or(&cwd).join(DEFAULT_PACKAGES_DIR)
            }),
        };
        debug!(packages_dir = %packages_dir.display(), "loading workspace");

        let packages = Scanner::new(&packages_dir)
            .scan()
            .with_context(|| format!("Failed to scan {}", packages_dir.display()))?;
        let graph = PackageGraph::new(packages)?;

        Ok(Self {
            config,
            packages_dir,
            graph,
        })
    }

    fn filter(&self, args: &WorkspaceArgs) -> Result<SelectionFilter> {
        Ok(SelectionFilter::new(&args.include, &args.exclude)?
            .with_dependents(args.dependents)
            .with_dependencies(args.dependencies))
    }

    fn modules_dir(&self) -> &str {
        self.config
            .modules_dir
            .as_deref()
            .unwrap_or(DEFAULT_MODULES_DIR)
    }

    fn linker(&self) -> Linker {
        Linker::new().with_modules_dir(self.modules_dir())
    }

    /// Shim directory relative to a package.
    fn bin_dir(&self) -> PathBuf {
        PathBuf::from(self.modules_dir()).join(DEFAULT_BIN_DIR)
    }

    fn client(&self, args: &WorkspaceArgs) -> String {
        args.client
            .clone()
            .unwrap_or_else(|| self.config.client_or_default().to_string())
    }

    fn concurrency(&self, args: &WorkspaceArgs) -> Option<usize> {
        args.concurrency.or(self.config.concurrency)
    }

    fn bail(&self, args: &WorkspaceArgs) -> bool {
        args.bail || self.config.bail.unwrap_or(false)
    }
}
