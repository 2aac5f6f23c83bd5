//! Task execution engine and orchestration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::graph::PackageGraph;
use crate::report::RunReport;
use crate::scheduler::Scheduler;
use crate::selection::Selection;
use crate::task::{PackageTask, TaskEnvironment};

/// Requests that a run stops dispatching new packages.
///
/// Running tasks are never interrupted; they finish and are recorded.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Number of parallel tasks when none is configured.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Executes a task across selected packages respecting dependency order.
#[derive(Debug, Clone)]
pub struct TaskRunner {
    concurrency: usize,
    bail: bool,
    abort: AbortHandle,
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

type Completion = (String, std::result::Result<(), String>);

impl TaskRunner {
    pub fn new() -> Self {
        Self {
            concurrency: default_concurrency(),
            bail: false,
            abort: AbortHandle::default(),
        }
    }

    /// Maximum number of simultaneously running tasks (at least one).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_max_parallel(self, max_parallel: Option<usize>) -> Self {
        match max_parallel {
            Some(n) => self.with_concurrency(n),
            None => self,
        }
    }

    /// Halt all further dispatch once any package fails.
    pub fn with_bail(mut self, bail: bool) -> Self {
        self.bail = bail;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Runs `task` once per selected package.
    ///
    /// A package is dispatched only after every scheduled dependency has
    /// reached a terminal state. Task failures are recorded in the report
    /// rather than returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CircularDependency`] if the selection cannot be
    /// ordered; no task is started in that case.
    pub async fn run(
        &self,
        graph: &PackageGraph,
        selection: &Selection<'_>,
        task: Arc<dyn PackageTask>,
        env: TaskEnvironment,
    ) -> Result<RunReport> {
        let start = Instant::now();
        let mut scheduler = Scheduler::new(graph, selection)?.with_bail(self.bail);
        let env = Arc::new(env);
        let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();

        info!(
            task = %task.describe(),
            packages = selection.len(),
            concurrency = self.concurrency,
            "running task"
        );

        loop {
            if self.abort.is_aborted() && !scheduler.is_halted() {
                warn!("run aborted, no further packages will be started");
                scheduler.halt();
            }

            while scheduler.running() < self.concurrency {
                let Some(package) = scheduler.next_ready() else {
                    break;
                };
                debug!(package = %package.name, "dispatching");

                let package = package.clone();
                let task = Arc::clone(&task);
                let env = Arc::clone(&env);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let name = package.name.clone();
                    let handle = tokio::spawn(async move { task.execute(&package, &env).await });
                    let result = match handle.await {
                        Ok(Ok(())) => Ok(()),
                        Ok(Err(Error::TaskExecution { message, .. })) => Err(message),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(join_error) => Err(format!("task panicked: {}", join_error)),
                    };
                    let _ = tx.send((name, result));
                });
            }

            if scheduler.running() == 0 {
                break;
            }

            let Some((name, result)) = rx.recv().await else {
                break;
            };
            match &result {
                Ok(()) => debug!(package = %name, "succeeded"),
                Err(message) => warn!(package = %name, error = %message, "failed"),
            }
            scheduler.complete(&name, result);
        }

        debug_assert!(scheduler.is_finished());
        Ok(scheduler.into_report(task.describe(), start.elapsed()))
    }
}
