//! Materializes local dependency edges as symlinks.
//!
//! Every package gets a link `<package>/<modules_dir>/<dependency>` pointing
//! at the dependency's directory, plus one shim per executable the
//! dependency declares under `<package>/<modules_dir>/<bin_dir>`. Whatever
//! already exists at a link path is replaced, so linking is idempotent and
//! repairs links left behind by an earlier, different graph. Pruning only
//! touches names a workspace package could own.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::graph::PackageGraph;
use crate::package::Package;

pub const DEFAULT_MODULES_DIR: &str = "node_modules";
pub const DEFAULT_BIN_DIR: &str = ".bin";

/// Counts of what a linking pass touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkSummary {
    pub packages: usize,
    pub links: usize,
    pub shims: usize,
    pub pruned: usize,
}

impl LinkSummary {
    fn merge(self, other: LinkSummary) -> LinkSummary {
        LinkSummary {
            packages: self.packages + other.packages,
            links: self.links + other.links,
            shims: self.shims + other.shims,
            pruned: self.pruned + other.pruned,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Linker {
    modules_dir: PathBuf,
    bin_dir: PathBuf,
    prune_dangling: bool,
}

impl Default for Linker {
    fn default() -> Self {
        Self::new()
    }
}

impl Linker {
    pub fn new() -> Self {
        Self {
            modules_dir: PathBuf::from(DEFAULT_MODULES_DIR),
            bin_dir: PathBuf::from(DEFAULT_BIN_DIR),
            prune_dangling: true,
        }
    }

    pub fn with_modules_dir(mut self, modules_dir: impl Into<PathBuf>) -> Self {
        self.modules_dir = modules_dir.into();
        self
    }

    /// Shim directory, relative to the modules directory.
    pub fn with_bin_dir(mut self, bin_dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = bin_dir.into();
        self
    }

    /// Remove dangling symlinks left at link or shim names of workspace
    /// packages after linking.
    pub fn with_prune_dangling(mut self, prune: bool) -> Self {
        self.prune_dangling = prune;
        self
    }

    /// Path of the link for `dependency` inside `package`.
    pub fn link_path(&self, package: &Package, dependency: &str) -> PathBuf {
        package.path.join(&self.modules_dir).join(dependency)
    }

    /// Path of the shim for executable `name` inside `package`.
    pub fn shim_path(&self, package: &Package, name: &str) -> PathBuf {
        self.bin_root(package).join(name)
    }

    fn bin_root(&self, package: &Package) -> PathBuf {
        package.path.join(&self.modules_dir).join(&self.bin_dir)
    }

    /// Links every package of `graph` to its local dependencies.
    ///
    /// Packages are processed in parallel. The first failure aborts the
    /// whole pass; a partially linked repository should not be used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PackageNotFound`] if a dependency is missing from the
    /// graph, or [`Error::Link`] if a filesystem operation fails.
    pub fn link_all(&self, graph: &PackageGraph) -> Result<LinkSummary> {
        let packages: Vec<&Package> = graph.packages().collect();
        let summaries: Vec<LinkSummary> = packages
            .par_iter()
            .map(|package| self.link_package(graph, package))
            .collect::<Result<_>>()?;

        let summary = summaries
            .into_iter()
            .fold(LinkSummary::default(), LinkSummary::merge);
        debug!(
            packages = summary.packages,
            links = summary.links,
            shims = summary.shims,
            pruned = summary.pruned,
            "linked local packages"
        );
        Ok(summary)
    }

    /// Links a single package to its local dependencies.
    pub fn link_package(&self, graph: &PackageGraph, package: &Package) -> Result<LinkSummary> {
        let mut summary = LinkSummary {
            packages: 1,
            ..LinkSummary::default()
        };
        let mut created: HashSet<PathBuf> = HashSet::new();

        for dependency_name in &package.local_dependencies {
            let dependency =
                graph
                    .get_package(dependency_name)
                    .ok_or_else(|| Error::PackageNotFound {
                        name: dependency_name.clone(),
                        available: graph.names().collect::<Vec<_>>().join(", "),
                    })?;

            let link_path = self.link_path(package, dependency_name);
            replace_with_symlink(&package.name, &dependency.path, &link_path)?;
            created.insert(link_path);
            trace!(package = %package.name, dependency = %dependency_name, "linked");
            summary.links += 1;

            for bin_name in dependency.bin.keys() {
                let Some(target) = dependency.bin_path(bin_name) else {
                    continue;
                };
                let shim_path = self.shim_path(package, bin_name);
                replace_with_symlink(&package.name, &target, &shim_path)?;
                make_executable(&target)
                    .map_err(|source| link_error(&dependency.name, &target, source))?;
                created.insert(shim_path);
                trace!(package = %package.name, bin = %bin_name, "linked shim");
                summary.shims += 1;
            }
        }

        if self.prune_dangling {
            summary.pruned = self.prune_package(graph, package, &created)?;
        }

        Ok(summary)
    }

    /// Removes dangling symlinks at the link and shim paths some package of
    /// `graph` could own, except the ones just created (a shim may point at
    /// build output that does not exist yet). Entries under any other name
    /// belong to the package manager and are left alone. Returns how many
    /// were removed.
    fn prune_package(
        &self,
        graph: &PackageGraph,
        package: &Package,
        keep: &HashSet<PathBuf>,
    ) -> Result<usize> {
        if !package.path.join(&self.modules_dir).is_dir() {
            return Ok(0);
        }

        let mut pruned = 0;
        for other in graph.packages().filter(|p| p.name != package.name) {
            let candidates = std::iter::once(self.link_path(package, &other.name))
                .chain(other.bin.keys().map(|bin| self.shim_path(package, bin)));
            for path in candidates {
                if keep.contains(&path) || !is_dangling_symlink(&path) {
                    continue;
                }
                remove_symlink(&path)
                    .map_err(|source| link_error(&package.name, &path, source))?;
                debug!(package = %package.name, path = %path.display(), "pruned dangling link");
                pruned += 1;
            }
        }
        Ok(pruned)
    }
}

fn link_error(package: &str, path: &Path, source: io::Error) -> Error {
    Error::Link {
        package: package.to_string(),
        path: path.to_path_buf(),
        source,
    }
}

/// Removes whatever is at `link` and creates a symlink to `target`.
fn replace_with_symlink(package: &str, target: &Path, link: &Path) -> Result<()> {
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent).map_err(|source| link_error(package, parent, source))?;
    }

    match fs::symlink_metadata(link) {
        Ok(metadata) => {
            let removed = if metadata.file_type().is_symlink() {
                remove_symlink(link)
            } else if metadata.is_dir() {
                fs::remove_dir_all(link)
            } else {
                fs::remove_file(link)
            };
            removed.map_err(|source| link_error(package, link, source))?;
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(link_error(package, link, source)),
    }

    create_symlink(target, link).map_err(|source| link_error(package, link, source))
}

fn is_dangling_symlink(path: &Path) -> bool {
    let is_symlink = fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    is_symlink && fs::metadata(path).is_err()
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    use std::os::windows::fs::{symlink_dir, symlink_file};

    if target.is_dir() {
        symlink_dir(target, link)
    } else {
        symlink_file(target, link)
    }
}

#[cfg(unix)]
fn remove_symlink(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

#[cfg(windows)]
fn remove_symlink(path: &Path) -> io::Result<()> {
    // Directory symlinks need remove_dir on Windows.
    fs::remove_dir(path).or_else(|_| fs::remove_file(path))
}

/// Marks an existing shim target executable. Targets that do not exist yet
/// (for example build output) are left alone.
#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    let mut permissions = metadata.permissions();
    let mode = permissions.mode();
    if metadata.is_file() && mode & 0o111 != 0o111 {
        permissions.set_mode(mode | 0o111);
        fs::set_permissions(path, permissions)?;
    }
    Ok(())
}

#[cfg(windows)]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
