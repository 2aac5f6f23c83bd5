//! `package.json` parsing.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::package::Package;

pub const MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BinValue {
    Single(String),
    Map(IndexMap<String, String>),
}

/// The subset of `package.json` meshpack cares about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub optional_dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub peer_dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub scripts: IndexMap<String, String>,
    #[serde(default)]
    pub bin: Option<BinValue>,
}

impl Manifest {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(content).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if manifest.name.trim().is_empty() {
            return Err(Error::Manifest {
                path: path.to_path_buf(),
                message: "missing package name".to_string(),
            });
        }
        Ok(manifest)
    }

    /// Every dependency name declared in any dependency section.
    pub fn declared_dependencies(&self) -> BTreeSet<&str> {
        self.dependencies
            .keys()
            .chain(self.dev_dependencies.keys())
            .chain(self.optional_dependencies.keys())
            .chain(self.peer_dependencies.keys())
            .map(String::as_str)
            .collect()
    }

    /// Executables keyed by name. A bare string exposes a single executable
    /// named after the unscoped package name.
    pub fn executables(&self) -> IndexMap<String, PathBuf> {
        match &self.bin {
            None => IndexMap::new(),
            Some(BinValue::Single(rel)) => {
                let bin_name = self
                    .name
                    .rsplit_once('/')
                    .map(|(_, unscoped)| unscoped)
                    .unwrap_or(&self.name);
                IndexMap::from([(bin_name.to_string(), PathBuf::from(rel))])
            }
            Some(BinValue::Map(map)) => map
                .iter()
                .map(|(name, rel)| (name.clone(), PathBuf::from(rel)))
                .collect(),
        }
    }

    /// Builds the package, keeping only dependencies found in `local_names`.
    pub fn into_package(self, path: PathBuf, local_names: &BTreeSet<String>) -> Package {
        let local_dependencies: Vec<String> = self
            .declared_dependencies()
            .into_iter()
            .filter(|dep| *dep != self.name && local_names.contains(*dep))
            .map(str::to_string)
            .collect();
        let bin = self.executables();

        let mut package = Package::new(self.name, path, local_dependencies);
        package.version = self.version;
        package.scripts = self.scripts;
        package.bin = bin;
        package
    }
}
