use async_trait::async_trait;
use meshpack_core::error::Result;
use meshpack_core::package::Package;
use meshpack_core::task::{PackageTask, TaskEnvironment};

use crate::process::run_in_package;

/// Runs `<client> install <args>` in every package.
#[derive(Debug, Clone)]
pub struct InstallTask {
    client: String,
    args: Vec<String>,
}

impl InstallTask {
    pub fn new(client: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            client: client.into(),
            args,
        }
    }

    fn arguments(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push("install".to_string());
        args.extend(self.args.iter().cloned());
        args
    }
}

#[async_trait]
impl PackageTask for InstallTask {
    fn describe(&self) -> String {
        crate::command_line(&self.client, &self.arguments())
    }

    async fn execute(&self, package: &Package, env: &TaskEnvironment) -> Result<()> {
        run_in_package(package, env, &self.client, &self.arguments()).await
    }
}
