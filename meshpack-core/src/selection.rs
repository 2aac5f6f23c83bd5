//! Package selection: name filters, closure expansion and post-filtering.

use std::collections::HashSet;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::{EdgeKind, PackageGraph};
use crate::package::Package;

/// User-supplied selection criteria.
///
/// Patterns are unanchored regular expressions matched against the bare
/// package name.
#[derive(Debug, Clone, Default)]
pub struct SelectionFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    dependents: bool,
    dependencies: bool,
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            Regex::new(pattern).map_err(|source| Error::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
        })
        .collect()
}

fn join_patterns(patterns: &[Regex]) -> String {
    patterns
        .iter()
        .map(Regex::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl SelectionFilter {
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if any pattern fails to compile.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
            dependents: false,
            dependencies: false,
        })
    }

    /// Selects every package.
    pub fn all() -> Self {
        Self::default()
    }

    /// Also selects all transitive dependents of matching packages.
    pub fn with_dependents(mut self, dependents: bool) -> Self {
        self.dependents = dependents;
        self
    }

    /// Also selects all transitive dependencies of matching packages.
    pub fn with_dependencies(mut self, dependencies: bool) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn include_dependents(&self) -> bool {
        self.dependents
    }

    pub fn include_dependencies(&self) -> bool {
        self.dependencies
    }

    pub fn include_patterns(&self) -> Vec<&str> {
        self.include.iter().map(Regex::as_str).collect()
    }

    pub fn exclude_patterns(&self) -> Vec<&str> {
        self.exclude.iter().map(Regex::as_str).collect()
    }

    /// Root filter: included (or no include list) and not excluded.
    pub fn matches(&self, name: &str) -> bool {
        (self.include.is_empty() || self.include.iter().any(|re| re.is_match(name)))
            && (self.exclude.is_empty() || !self.exclude.iter().any(|re| re.is_match(name)))
    }
}

/// The packages a command operates on.
///
/// `packages` are the runnable members, sorted by name. `barriers` were
/// pulled in by the filter or closure but removed by the post-filter; they
/// are scheduled as no-op ordering points and never run.
#[derive(Debug, Clone)]
pub struct Selection<'g> {
    packages: Vec<&'g Package>,
    barriers: Vec<&'g Package>,
    roots: usize,
}

impl<'g> Selection<'g> {
    pub fn packages(&self) -> &[&'g Package] {
        &self.packages
    }

    pub fn barriers(&self) -> &[&'g Package] {
        &self.barriers
    }

    pub fn names(&self) -> Vec<&'g str> {
        self.packages.iter().map(|p| p.name.as_str()).collect()
    }

    /// Number of packages that passed the root filter.
    pub fn roots(&self) -> usize {
        self.roots
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.iter().any(|p| p.name == name)
    }
}

/// Runs the selection pipeline: root filter, closure expansion,
/// deduplication, sort by name, post-filter.
///
/// # Errors
///
/// Returns [`Error::NoMatchingPackages`] when no package passes the root
/// filter. A selection emptied by `post_filter` is returned as `Ok`.
pub fn select<'g, P>(
    graph: &'g PackageGraph,
    filter: &SelectionFilter,
    post_filter: P,
) -> Result<Selection<'g>>
where
    P: Fn(&Package) -> bool,
{
    let roots: Vec<&Package> = graph.packages().filter(|p| filter.matches(&p.name)).collect();
    if roots.is_empty() {
        return Err(Error::NoMatchingPackages {
            include: join_patterns(&filter.include),
            exclude: join_patterns(&filter.exclude),
        });
    }
    let root_count = roots.len();

    let mut expanded: Vec<&Package> = Vec::with_capacity(roots.len());
    for root in roots {
        expanded.push(root);
        if filter.dependents {
            expanded.extend(graph.closure(&root.name, EdgeKind::Dependents)?);
        }
        if filter.dependencies {
            expanded.extend(graph.closure(&root.name, EdgeKind::Dependencies)?);
        }
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(expanded.len());
    expanded.retain(|p| seen.insert(p.name.as_str()));
    expanded.sort_by(|a, b| a.name.cmp(&b.name));

    let (packages, barriers): (Vec<&Package>, Vec<&Package>) =
        expanded.into_iter().partition(|p| post_filter(*p));

    debug!(
        roots = root_count,
        selected = packages.len(),
        barriers = barriers.len(),
        "selected packages"
    );

    Ok(Selection {
        packages,
        barriers,
        roots: root_count,
    })
}
