//! Workspace configuration from `meshpack.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "meshpack.toml";
pub const DEFAULT_PACKAGES_DIR: &str = "packages";
pub const DEFAULT_CLIENT: &str = "yarn";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    workspace: WorkspaceConfig,
}

/// Workspace-level settings. Every field is optional; command-line flags
/// take precedence over them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Packages directory, relative to the config file.
    pub packages_dir: Option<PathBuf>,
    /// Default number of parallel tasks.
    pub concurrency: Option<usize>,
    /// Stop dispatching after the first failure.
    pub bail: Option<bool>,
    /// Package manager used by `install` and `run`.
    pub client: Option<String>,
    /// Directory dependencies are linked into.
    pub modules_dir: Option<String>,
    /// Path to the config file (for resolving relative paths).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl WorkspaceConfig {
    /// Parses a config file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content).map_err(|error| Error::Toml {
            error,
            context: path.display().to_string(),
        })?;
        let mut config = file.workspace;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Looks for `meshpack.toml` in `start` and its ancestors, stopping at
    /// the first directory containing `.git`.
    pub fn discover(start: &Path) -> Result<Option<Self>> {
        let mut current = Some(start);

        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                debug!(path = %candidate.display(), "loaded workspace config");
                return Self::from_path(&candidate).map(Some);
            }
            if dir.join(".git").exists() {
                break;
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Directory containing the config file, if it was loaded from disk.
    pub fn root(&self) -> Option<&Path> {
        self.config_path.as_deref().and_then(Path::parent)
    }

    /// Packages directory resolved against the config file location.
    pub fn resolved_packages_dir(&self) -> Option<PathBuf> {
        let dir = self.packages_dir.as_ref()?;
        if dir.is_absolute() {
            return Some(dir.clone());
        }
        Some(match self.root() {
            Some(root) => root.join(dir),
            None => dir.clone(),
        })
    }

    pub fn client_or_default(&self) -> &str {
        self.client.as_deref().unwrap_or(DEFAULT_CLIENT)
    }
}
