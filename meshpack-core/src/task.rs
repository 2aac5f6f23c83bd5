//! Task abstraction executed once per selected package.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::linker::{DEFAULT_BIN_DIR, DEFAULT_MODULES_DIR};
use crate::package::Package;

/// Receives child process output: `(package_name, line, is_stderr)`.
pub type OutputHandler = Arc<dyn Fn(&str, &str, bool) + Send + Sync>;

/// Everything a task needs besides the package itself.
#[derive(Clone)]
pub struct TaskEnvironment {
    pub packages_dir: PathBuf,
    /// Shim directory relative to a package, prepended to `PATH`.
    pub bin_dir: PathBuf,
    pub vars: Vec<(String, String)>,
    /// When unset, child processes inherit stdout and stderr.
    pub on_output: Option<OutputHandler>,
}

impl TaskEnvironment {
    pub fn new(packages_dir: impl Into<PathBuf>) -> Self {
        Self {
            packages_dir: packages_dir.into(),
            bin_dir: PathBuf::from(DEFAULT_MODULES_DIR).join(DEFAULT_BIN_DIR),
            vars: Vec::new(),
            on_output: None,
        }
    }

    pub fn with_bin_dir(mut self, bin_dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = bin_dir.into();
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.push((key.into(), value.into()));
        self
    }

    pub fn with_output_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &str, bool) + Send + Sync + 'static,
    {
        self.on_output = Some(Arc::new(handler));
        self
    }
}

impl fmt::Debug for TaskEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskEnvironment")
            .field("packages_dir", &self.packages_dir)
            .field("bin_dir", &self.bin_dir)
            .field("vars", &self.vars)
            .field("on_output", &self.on_output.is_some())
            .finish()
    }
}

/// An operation run for each package of a selection.
///
/// Any `Err` marks the package as failed; its dependents are skipped.
#[async_trait]
pub trait PackageTask: Send + Sync {
    /// Human-readable command line, used in reports.
    fn describe(&self) -> String;

    async fn execute(&self, package: &Package, env: &TaskEnvironment) -> Result<()>;
}
