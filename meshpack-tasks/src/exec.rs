use async_trait::async_trait;
use meshpack_core::error::Result;
use meshpack_core::package::Package;
use meshpack_core::task::{PackageTask, TaskEnvironment};

use crate::process::run_in_package;

/// Runs an arbitrary binary in every package. Shims under the package's
/// `.bin` directory take precedence over the inherited `PATH`.
#[derive(Debug, Clone)]
pub struct ExecTask {
    binary: String,
    args: Vec<String>,
}

impl ExecTask {
    pub fn new(binary: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
        }
    }
}

#[async_trait]
impl PackageTask for ExecTask {
    fn describe(&self) -> String {
        crate::command_line(&self.binary, &self.args)
    }

    async fn execute(&self, package: &Package, env: &TaskEnvironment) -> Result<()> {
        run_in_package(package, env, &self.binary, &self.args).await
    }
}
