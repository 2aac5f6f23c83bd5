use async_trait::async_trait;
use meshpack_core::error::Result;
use meshpack_core::package::Package;
use meshpack_core::task::{PackageTask, TaskEnvironment};

use crate::process::run_in_package;

/// Runs a manifest script through the package manager:
/// `<client> run <script> <args>`.
///
/// Selection usually post-filters packages without the script, so this task
/// never checks for it itself.
#[derive(Debug, Clone)]
pub struct RunScriptTask {
    client: String,
    script: String,
    args: Vec<String>,
}

impl RunScriptTask {
    pub fn new(client: impl Into<String>, script: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            client: client.into(),
            script: script.into(),
            args,
        }
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    fn arguments(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.args.len() + 2);
        args.push("run".to_string());
        args.push(self.script.clone());
        args.extend(self.args.iter().cloned());
        args
    }
}

#[async_trait]
impl PackageTask for RunScriptTask {
    fn describe(&self) -> String {
        crate::command_line(&self.client, &self.arguments())
    }

    async fn execute(&self, package: &Package, env: &TaskEnvironment) -> Result<()> {
        run_in_package(package, env, &self.client, &self.arguments()).await
    }
}
