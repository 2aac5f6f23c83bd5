//! Dependency-ordered dispatch state machine.
//!
//! The scheduler owns no tasks and does no I/O. The [`TaskRunner`] asks it
//! for the next ready package, reports completions back, and stops once
//! [`Scheduler::is_finished`] holds.
//!
//! [`TaskRunner`]: crate::TaskRunner

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::graph::{EdgeKind, PackageGraph};
use crate::package::Package;
use crate::report::{Outcome, RunReport, SkipReason};
use crate::selection::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageState {
    Pending,
    Ready,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl PackageState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PackageState::Succeeded | PackageState::Failed | PackageState::Skipped
        )
    }

    #[inline]
    fn is_waiting(self) -> bool {
        matches!(self, PackageState::Pending | PackageState::Ready)
    }
}

#[derive(Debug)]
struct Node<'g> {
    package: &'g Package,
    /// Ordering-only member: completes without running.
    barrier: bool,
    state: PackageState,
    /// Scheduled dependencies not yet succeeded.
    remaining: usize,
    outcome: Option<Outcome>,
}

#[derive(Debug)]
pub struct Scheduler<'g> {
    graph: &'g PackageGraph,
    /// Sorted by name; indices double as the dispatch tie-break.
    nodes: Vec<Node<'g>>,
    index: HashMap<&'g str, usize>,
    ready: BTreeSet<usize>,
    running: usize,
    bail: bool,
    halted: bool,
    dispatch_order: Vec<String>,
}

impl<'g> Scheduler<'g> {
    /// Builds the initial state for `selection`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CircularDependency`] if the scheduled packages cannot
    /// be ordered.
    pub fn new(graph: &'g PackageGraph, selection: &Selection<'g>) -> Result<Self> {
        let mut members: Vec<(&'g Package, bool)> = selection
            .packages()
            .iter()
            .map(|p| (*p, false))
            .chain(selection.barriers().iter().map(|p| (*p, true)))
            .collect();
        members.sort_by(|a, b| a.0.name.cmp(&b.0.name));

        let index: HashMap<&'g str, usize> = members
            .iter()
            .enumerate()
            .map(|(i, (p, _))| (p.name.as_str(), i))
            .collect();

        let nodes: Vec<Node<'g>> = members
            .into_iter()
            .map(|(package, barrier)| Node {
                package,
                barrier,
                state: PackageState::Pending,
                remaining: package
                    .local_dependencies
                    .iter()
                    .filter(|dep| index.contains_key(dep.as_str()))
                    .count(),
                outcome: None,
            })
            .collect();

        let mut scheduler = Self {
            graph,
            nodes,
            index,
            ready: BTreeSet::new(),
            running: 0,
            bail: false,
            halted: false,
            dispatch_order: Vec::new(),
        };
        scheduler.check_orderable()?;

        let initial: Vec<usize> = (0..scheduler.nodes.len())
            .filter(|i| scheduler.nodes[*i].remaining == 0)
            .collect();
        for idx in initial {
            scheduler.make_ready(idx);
        }

        Ok(scheduler)
    }

    /// Stop dispatching anything new after the first failure.
    pub fn with_bail(mut self, bail: bool) -> Self {
        self.bail = bail;
        self
    }

    /// Kahn's algorithm over the scheduled members only.
    fn check_orderable(&self) -> Result<()> {
        let mut remaining: Vec<usize> = self.nodes.iter().map(|n| n.remaining).collect();
        let mut queue: Vec<usize> = (0..self.nodes.len()).filter(|i| remaining[*i] == 0).collect();
        let mut visited = 0;

        while let Some(idx) = queue.pop() {
            visited += 1;
            for dependent in &self.nodes[idx].package.local_dependents {
                if let Some(&d) = self.index.get(dependent.as_str()) {
                    remaining[d] -= 1;
                    if remaining[d] == 0 {
                        queue.push(d);
                    }
                }
            }
        }

        if visited == self.nodes.len() {
            return Ok(());
        }
        let index = &self.index;
        self.graph.check_acyclic_within(|name| index.contains_key(name))?;
        let stuck = (0..self.nodes.len())
            .filter(|i| remaining[*i] > 0)
            .map(|i| self.nodes[i].package.name.clone())
            .collect();
        Err(Error::CircularDependency { cycle: stuck })
    }

    /// Moves a package whose dependencies are all done to `Ready`. Barriers
    /// complete on the spot and release their own dependents.
    fn make_ready(&mut self, idx: usize) {
        let node = &mut self.nodes[idx];
        if node.barrier {
            debug!(package = %node.package.name, "barrier passed");
            node.state = PackageState::Succeeded;
            node.outcome = Some(Outcome::Succeeded);
            self.release_dependents(idx);
        } else {
            node.state = PackageState::Ready;
            self.ready.insert(idx);
        }
    }

    /// Decrements the counters of the direct scheduled dependents of a
    /// succeeded package.
    fn release_dependents(&mut self, idx: usize) {
        let package = self.nodes[idx].package;
        for dependent in &package.local_dependents {
            let Some(&d) = self.index.get(dependent.as_str()) else {
                continue;
            };
            if self.nodes[d].state != PackageState::Pending {
                continue;
            }
            self.nodes[d].remaining -= 1;
            if self.nodes[d].remaining == 0 {
                self.make_ready(d);
            }
        }
    }

    /// Takes the next ready package (lowest name first) and marks it running.
    /// Returns `None` when nothing is ready or dispatch has been halted.
    pub fn next_ready(&mut self) -> Option<&'g Package> {
        if self.halted {
            return None;
        }
        let idx = self.ready.pop_first()?;
        let node = &mut self.nodes[idx];
        node.state = PackageState::Running;
        self.running += 1;
        self.dispatch_order.push(node.package.name.clone());
        Some(node.package)
    }

    /// Records the result of a running package.
    ///
    /// On success its direct dependents move closer to ready. On failure all
    /// of its transitive scheduled dependents are skipped, and with bail
    /// enabled the whole run is halted.
    pub fn complete(&mut self, name: &str, result: std::result::Result<(), String>) {
        let Some(&idx) = self.index.get(name) else {
            warn!(package = %name, "completion for unscheduled package ignored");
            return;
        };
        if self.nodes[idx].state != PackageState::Running {
            warn!(
                package = %name,
                state = ?self.nodes[idx].state,
                "completion for package that is not running ignored"
            );
            return;
        }
        self.running -= 1;

        match result {
            Ok(()) => {
                self.nodes[idx].state = PackageState::Succeeded;
                self.nodes[idx].outcome = Some(Outcome::Succeeded);
                self.release_dependents(idx);
            }
            Err(message) => {
                self.nodes[idx].state = PackageState::Failed;
                self.nodes[idx].outcome = Some(Outcome::Failed(message));
                self.skip_dependents_of(idx);
                if self.bail {
                    self.halt();
                }
            }
        }
    }

    fn skip_dependents_of(&mut self, failed: usize) {
        let culprit = self.nodes[failed].package.name.clone();
        let index = &self.index;
        let downstream: Vec<usize> = self
            .graph
            .closure_within(&culprit, EdgeKind::Dependents, |name| index.contains_key(name))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| index.get(p.name.as_str()).copied())
            .filter(|d| *d != failed)
            .collect();

        for d in downstream {
            if self.nodes[d].state.is_waiting() {
                debug!(
                    package = %self.nodes[d].package.name,
                    culprit = %culprit,
                    "skipping dependent of failed package"
                );
                self.nodes[d].state = PackageState::Skipped;
                self.nodes[d].outcome = Some(Outcome::Skipped(SkipReason::UpstreamFailed {
                    culprit: culprit.clone(),
                }));
                self.ready.remove(&d);
            }
        }
    }

    /// Stops all further dispatch. Waiting packages end up skipped; running
    /// ones may still complete.
    pub fn halt(&mut self) {
        if self.halted {
            return;
        }
        self.halted = true;
        self.ready.clear();
        for node in &mut self.nodes {
            if node.state.is_waiting() {
                node.state = PackageState::Skipped;
                node.outcome = Some(Outcome::Skipped(SkipReason::Aborted));
            }
        }
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    #[inline]
    pub fn running(&self) -> usize {
        self.running
    }

    pub fn state(&self, name: &str) -> Option<PackageState> {
        self.index.get(name).map(|idx| self.nodes[*idx].state)
    }

    /// Nothing is running and nothing is left to dispatch.
    pub fn is_finished(&self) -> bool {
        self.running == 0 && !self.nodes.iter().any(|n| n.state.is_waiting())
    }

    pub fn dispatch_order(&self) -> &[String] {
        &self.dispatch_order
    }

    /// Final outcomes of the runnable (non-barrier) packages.
    pub fn into_report(self, task: String, elapsed: Duration) -> RunReport {
        let outcomes = self
            .nodes
            .into_iter()
            .filter(|n| !n.barrier)
            .map(|n| {
                let outcome = n
                    .outcome
                    .unwrap_or(Outcome::Skipped(SkipReason::Aborted));
                (n.package.name.clone(), outcome)
            })
            .collect();
        RunReport {
            task,
            outcomes,
            dispatch_order: self.dispatch_order,
            elapsed,
        }
    }
}
