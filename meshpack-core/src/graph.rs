//! Package dependency graph using petgraph.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::{Error, Result};
use crate::package::Package;

/// Which edge set a traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Packages this package depends on.
    Dependencies,
    /// Packages that depend on this package.
    Dependents,
}

/// Graph of local package dependencies.
///
/// Edges point from a package to the packages it depends on. The graph is
/// built once per invocation and never mutated afterwards. Construction does
/// not reject cycles; the scheduler rejects those inside what it schedules.
#[derive(Debug)]
pub struct PackageGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
    packages: BTreeMap<String, Package>,
}

impl PackageGraph {
    /// Creates a graph from discovered packages and fills in the reverse
    /// `local_dependents` edges.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate names, self-dependencies or a
    /// dependency on a package that is not part of the graph.
    pub fn new(packages: Vec<Package>) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::with_capacity(packages.len());
        let mut packages_map = BTreeMap::new();

        for mut package in packages {
            if node_map.contains_key(&package.name) {
                return Err(Error::DuplicatePackage(package.name));
            }
            package.local_dependents.clear();
            let node = graph.add_node(package.name.clone());
            node_map.insert(package.name.clone(), node);
            packages_map.insert(package.name.clone(), package);
        }

        let available = packages_map.keys().cloned().collect::<Vec<_>>().join(", ");
        let mut reverse: Vec<(String, String)> = Vec::new();

        for package in packages_map.values() {
            let from_node = node_map[&package.name];
            for dep_name in &package.local_dependencies {
                if dep_name == &package.name {
                    return Err(Error::SelfDependency(dep_name.clone()));
                }
                let to_node = node_map
                    .get(dep_name)
                    .ok_or_else(|| Error::PackageNotFound {
                        name: dep_name.clone(),
                        available: available.clone(),
                    })?;
                graph.add_edge(from_node, *to_node, ());
                reverse.push((dep_name.clone(), package.name.clone()));
            }
        }

        for (dependency, dependent) in reverse {
            if let Some(package) = packages_map.get_mut(&dependency) {
                package.local_dependents.insert(dependent);
            }
        }

        Ok(Self {
            graph,
            node_map,
            packages: packages_map,
        })
    }

    fn not_found(&self, name: &str) -> Error {
        Error::PackageNotFound {
            name: name.to_string(),
            available: self.names().collect::<Vec<_>>().join(", "),
        }
    }

    /// Retrieves a package by name.
    #[inline]
    pub fn get_package(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// All packages, sorted by name.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn edges_of<'a>(&'a self, package: &'a Package, kind: EdgeKind) -> &'a BTreeSet<String> {
        match kind {
            EdgeKind::Dependencies => &package.local_dependencies,
            EdgeKind::Dependents => &package.local_dependents,
        }
    }

    /// Returns direct dependencies of a package.
    ///
    /// # Errors
    ///
    /// Returns an error if the package is not found in the graph.
    pub fn dependencies(&self, package_name: &str) -> Result<Vec<String>> {
        let package = self
            .get_package(package_name)
            .ok_or_else(|| self.not_found(package_name))?;
        Ok(package.local_dependencies.iter().cloned().collect())
    }

    /// Returns direct dependents of a package (packages that depend on it).
    ///
    /// # Errors
    ///
    /// Returns an error if the package is not found in the graph.
    pub fn dependents(&self, package_name: &str) -> Result<Vec<String>> {
        let package = self
            .get_package(package_name)
            .ok_or_else(|| self.not_found(package_name))?;
        Ok(package.local_dependents.iter().cloned().collect())
    }

    /// Breadth-first transitive closure from `root`, root included.
    ///
    /// Every package appears at most once. The visited set also makes the
    /// traversal terminate on cyclic graphs.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not in the graph.
    pub fn closure(&self, root: &str, kind: EdgeKind) -> Result<Vec<&Package>> {
        self.closure_within(root, kind, |_| true)
    }

    /// Like [`closure`](Self::closure), but only traverses into packages for
    /// which `include` returns `true`. The root is always part of the result.
    pub fn closure_within<F>(&self, root: &str, kind: EdgeKind, include: F) -> Result<Vec<&Package>>
    where
        F: Fn(&str) -> bool,
    {
        let root_package = self.get_package(root).ok_or_else(|| self.not_found(root))?;

        let mut collected = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(root_package.name.as_str());
        queue.push_back(root_package);

        while let Some(current) = queue.pop_front() {
            collected.push(current);
            for next_name in self.edges_of(current, kind) {
                if visited.contains(next_name.as_str()) || !include(next_name.as_str()) {
                    continue;
                }
                let next = self
                    .get_package(next_name)
                    .ok_or_else(|| self.not_found(next_name))?;
                visited.insert(next.name.as_str());
                queue.push_back(next);
            }
        }

        Ok(collected)
    }

    /// Fails with the offending cycle path if local dependencies are cyclic.
    pub fn check_acyclic(&self) -> Result<()> {
        let mut components: Vec<Vec<NodeIndex>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .collect();
        if components.is_empty() {
            return Ok(());
        }
        components.sort_by(|a, b| self.min_name(a).cmp(self.min_name(b)));
        Err(Error::CircularDependency {
            cycle: self.cycle_path(&components[0]),
        })
    }

    /// Cycle check restricted to the packages for which `include` returns
    /// `true`. Edges leaving that set are ignored, so cycles elsewhere in the
    /// workspace do not matter.
    pub fn check_acyclic_within<F>(&self, include: F) -> Result<()>
    where
        F: Fn(&str) -> bool,
    {
        let members: BTreeSet<&str> = self
            .packages
            .keys()
            .map(String::as_str)
            .filter(|name| include(*name))
            .collect();
        let mut remaining: HashMap<&str, usize> = members
            .iter()
            .map(|name| {
                let deps = self.packages[*name]
                    .local_dependencies
                    .iter()
                    .filter(|dep| members.contains(dep.as_str()))
                    .count();
                (*name, deps)
            })
            .collect();

        let mut queue: Vec<&str> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| *name)
            .collect();
        while let Some(name) = queue.pop() {
            for dependent in &self.packages[name].local_dependents {
                if let Some(count) = remaining.get_mut(dependent.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push(dependent.as_str());
                    }
                }
            }
        }

        let stuck: BTreeSet<&str> = remaining
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(name, _)| name)
            .collect();
        let Some(&start) = stuck.first() else {
            return Ok(());
        };

        // Every stuck package has a stuck dependency, so the walk revisits one.
        let mut path = vec![start];
        let mut current = start;
        while let Some(next) = self.packages[current]
            .local_dependencies
            .iter()
            .map(String::as_str)
            .find(|dep| stuck.contains(dep))
        {
            if let Some(pos) = path.iter().position(|name| *name == next) {
                let mut cycle: Vec<String> =
                    path[pos..].iter().map(|name| name.to_string()).collect();
                cycle.push(next.to_string());
                return Err(Error::CircularDependency { cycle });
            }
            path.push(next);
            current = next;
        }

        Err(Error::CircularDependency {
            cycle: stuck.into_iter().map(String::from).collect(),
        })
    }

    fn min_name(&self, scc: &[NodeIndex]) -> &str {
        scc.iter()
            .map(|idx| self.graph[*idx].as_str())
            .min()
            .unwrap_or_default()
    }

    /// Shortest cycle through the lexicographically smallest member of `scc`,
    /// with the start repeated at the end.
    fn cycle_path(&self, scc: &[NodeIndex]) -> Vec<String> {
        let members: HashSet<NodeIndex> = scc.iter().copied().collect();
        let start = match scc.iter().min_by_key(|idx| &self.graph[**idx]) {
            Some(start) => *start,
            None => return Vec::new(),
        };

        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if !members.contains(&next) {
                    continue;
                }
                if next == start {
                    let mut path = vec![node];
                    let mut current = node;
                    while let Some(prev) = parent.get(&current) {
                        path.push(*prev);
                        current = *prev;
                    }
                    path.reverse();
                    path.push(start);
                    return path.into_iter().map(|idx| self.graph[idx].clone()).collect();
                }
                if !parent.contains_key(&next) {
                    parent.insert(next, node);
                    queue.push_back(next);
                }
            }
        }

        scc.iter().map(|idx| self.graph[*idx].clone()).collect()
    }

    /// Packages in dependency order (dependencies first), ties broken by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CircularDependency`] if the graph has a cycle.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let mut remaining: HashMap<&str, usize> = self
            .packages
            .values()
            .map(|p| (p.name.as_str(), p.local_dependencies.len()))
            .collect();
        let mut ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut order = Vec::with_capacity(self.packages.len());

        while let Some(name) = ready.pop_first() {
            order.push(name.to_string());
            for dependent in &self.packages[name].local_dependents {
                if let Some(count) = remaining.get_mut(dependent.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent.as_str());
                    }
                }
            }
        }

        if order.len() != self.packages.len() {
            self.check_acyclic()?;
        }
        Ok(order)
    }
}
