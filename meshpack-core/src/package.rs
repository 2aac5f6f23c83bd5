//! Package data model.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A package in the monorepo.
///
/// `local_dependencies` only ever names other packages of the same graph.
/// `local_dependents` is maintained by [`PackageGraph`](crate::PackageGraph)
/// and is empty on a freshly constructed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub local_dependencies: BTreeSet<String>,
    #[serde(default)]
    pub local_dependents: BTreeSet<String>,
    #[serde(default)]
    pub scripts: IndexMap<String, String>,
    #[serde(default)]
    pub bin: IndexMap<String, PathBuf>,
}

impl Package {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, deps: Vec<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            version: None,
            local_dependencies: deps.into_iter().collect(),
            local_dependents: BTreeSet::new(),
            scripts: IndexMap::new(),
            bin: IndexMap::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_script(mut self, name: impl Into<String>, command: impl Into<String>) -> Self {
        self.scripts.insert(name.into(), command.into());
        self
    }

    pub fn with_bin(mut self, name: impl Into<String>, relative: impl Into<PathBuf>) -> Self {
        self.bin.insert(name.into(), relative.into());
        self
    }

    #[inline]
    pub fn has_script(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    /// Absolute path of a declared executable, if any.
    pub fn bin_path(&self, name: &str) -> Option<PathBuf> {
        let relative = self.bin.get(name)?;
        let normalized: PathBuf = relative
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        Some(self.path.join(normalized))
    }

    /// Directory holding this package's installed dependencies.
    pub fn modules_dir(&self, modules_dir: impl AsRef<Path>) -> PathBuf {
        self.path.join(modules_dir)
    }
}
