//! Child process execution inside a package directory.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use meshpack_core::error::{Error, Result};
use meshpack_core::package::Package;
use meshpack_core::task::{OutputHandler, TaskEnvironment};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::debug;

pub const PACKAGE_NAME_VAR: &str = "MESHPACK_PACKAGE_NAME";
pub const PACKAGES_DIR_VAR: &str = "MESHPACK_PACKAGES_DIR";

/// Builds a `PATH` value with the package's shim directory in front.
pub fn search_path(package: &Package, env: &TaskEnvironment) -> Result<OsString> {
    let mut paths: Vec<PathBuf> = vec![package.path.join(&env.bin_dir)];
    if let Some(existing) = std::env::var_os("PATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(paths).map_err(|e| Error::TaskExecution {
        package: package.name.clone(),
        message: format!("Invalid PATH entry: {}", e),
    })
}

/// Runs `program args..` in the package directory and waits for it.
///
/// Output lines go to the environment's handler when one is set; otherwise
/// the child shares this process's stdout and stderr.
pub async fn run_in_package(
    package: &Package,
    env: &TaskEnvironment,
    program: &str,
    args: &[String],
) -> Result<()> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(&package.path)
        .env("PATH", search_path(package, env)?)
        .env(PACKAGE_NAME_VAR, &package.name)
        .env(PACKAGES_DIR_VAR, &env.packages_dir)
        .stdin(Stdio::null());
    for (key, value) in &env.vars {
        cmd.env(key, value);
    }

    let streamed = env.on_output.is_some();
    if streamed {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    }

    debug!(package = %package.name, program, ?args, "spawning");
    let mut child = cmd.spawn().map_err(|e| Error::TaskExecution {
        package: package.name.clone(),
        message: format!("Failed to spawn '{}': {}", program, e),
    })?;

    let mut readers: Vec<JoinHandle<()>> = Vec::new();
    if let Some(handler) = &env.on_output {
        if let Some(stdout) = child.stdout.take() {
            readers.push(forward_lines(stdout, package.name.clone(), Arc::clone(handler), false));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(forward_lines(stderr, package.name.clone(), Arc::clone(handler), true));
        }
    }

    let status = child.wait().await.map_err(|e| Error::TaskExecution {
        package: package.name.clone(),
        message: format!("Failed to wait for '{}': {}", program, e),
    })?;
    for reader in readers {
        let _ = reader.await;
    }

    if status.success() {
        return Ok(());
    }
    let message = match status.code() {
        Some(code) => format!("'{}' exited with code {}", program, code),
        None => format!("'{}' was terminated by a signal", program),
    };
    Err(Error::TaskExecution {
        package: package.name.clone(),
        message,
    })
}

fn forward_lines<R>(
    stream: R,
    package: String,
    handler: OutputHandler,
    is_stderr: bool,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            handler(&package, &line, is_stderr);
        }
    })
}
