//! Repository scanner for discovering packages.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::manifest::{Manifest, MANIFEST_FILE};
use crate::package::Package;

/// Scans a directory for packages.
///
/// Looks for `package.json` files at most two levels deep, so both
/// `packages/foo` and `packages/@scope/foo` layouts are found. Installed
/// dependencies under `node_modules` are never descended into.
pub struct Scanner {
    packages_dir: PathBuf,
}

impl Scanner {
    pub fn new(packages_dir: impl AsRef<Path>) -> Self {
        Self {
            packages_dir: packages_dir.as_ref().to_path_buf(),
        }
    }

    pub fn packages_dir(&self) -> &Path {
        &self.packages_dir
    }

    /// Discovers every package, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathNotFound`] if the packages directory is missing,
    /// [`Error::Manifest`] for unreadable manifests and
    /// [`Error::DuplicatePackage`] if two manifests share a name.
    pub fn scan(&self) -> Result<Vec<Package>> {
        if !self.packages_dir.is_dir() {
            return Err(Error::PathNotFound(self.packages_dir.clone()));
        }
        let root = std::fs::canonicalize(&self.packages_dir)?;

        let manifest_files: Vec<PathBuf> = WalkDir::new(&root)
            .min_depth(2)
            .max_depth(3)
            .into_iter()
            .filter_entry(|e| e.file_name() != "node_modules")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && e.file_name() == MANIFEST_FILE)
            .filter(|e| e.depth() == 2 || is_scoped_package(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();

        let manifests: Result<Vec<(PathBuf, Manifest)>> = manifest_files
            .into_par_iter()
            .map(|manifest_path| {
                let package_path = manifest_path
                    .parent()
                    .map(Path::to_path_buf)
                    .ok_or_else(|| Error::PathNotFound(manifest_path.clone()))?;
                let manifest = Manifest::from_path(&manifest_path)?;
                Ok((package_path, manifest))
            })
            .collect();
        let manifests = manifests?;

        let mut seen: HashMap<&str, &Path> = HashMap::with_capacity(manifests.len());
        for (path, manifest) in &manifests {
            if seen.insert(manifest.name.as_str(), path).is_some() {
                return Err(Error::DuplicatePackage(manifest.name.clone()));
            }
        }
        let local_names: BTreeSet<String> = seen.keys().map(|n| n.to_string()).collect();

        let mut packages: Vec<Package> = manifests
            .into_iter()
            .map(|(path, manifest)| manifest.into_package(path, &local_names))
            .collect();
        packages.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(
            packages_dir = %root.display(),
            count = packages.len(),
            "scanned packages"
        );
        Ok(packages)
    }

    pub fn scan_as_map(&self) -> Result<HashMap<String, Package>> {
        let packages = self.scan()?;
        Ok(packages.into_iter().map(|p| (p.name.clone(), p)).collect())
    }
}

/// `<root>/@scope/name/package.json`
fn is_scoped_package(manifest_path: &Path) -> bool {
    manifest_path
        .parent()
        .and_then(Path::parent)
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('@'))
}
