use async_trait::async_trait;
use meshpack_core::error::Result;
use meshpack_core::package::Package;
use meshpack_core::task::{PackageTask, TaskEnvironment};
use tracing::info;

/// Reports each package name in dependency order without running anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListTask;

#[async_trait]
impl PackageTask for ListTask {
    fn describe(&self) -> String {
        "list".to_string()
    }

    async fn execute(&self, package: &Package, env: &TaskEnvironment) -> Result<()> {
        match &env.on_output {
            Some(handler) => handler(&package.name, &package.name, false),
            None => info!(package = %package.name, path = %package.path.display(), "listed"),
        }
        Ok(())
    }
}
