use std::time::Duration;

use meshpack_core::graph::PackageGraph;
use meshpack_core::package::Package;
use meshpack_core::report::{Outcome, SkipReason};
use meshpack_core::scheduler::{PackageState, Scheduler};
use meshpack_core::selection::{select, SelectionFilter};

fn pkg(name: &str, deps: &[&str]) -> Package {
    Package::new(
        name,
        format!("/workspace/packages/{}", name),
        deps.iter().map(|d| d.to_string()).collect(),
    )
}

fn chain() -> PackageGraph {
    PackageGraph::new(vec![pkg("a", &[]), pkg("b", &["a"]), pkg("c", &["b"])]).unwrap()
}

fn next_name(scheduler: &mut Scheduler<'_>) -> Option<String> {
    scheduler.next_ready().map(|p| p.name.clone())
}

#[test]
fn test_only_dependency_free_packages_start_ready() {
    let graph = chain();
    let selection = select(&graph, &SelectionFilter::all(), |_| true).unwrap();
    let mut scheduler = Scheduler::new(&graph, &selection).unwrap();

    assert_eq!(scheduler.state("a"), Some(PackageState::Ready));
    assert_eq!(scheduler.state("b"), Some(PackageState::Pending));
    assert_eq!(next_name(&mut scheduler).as_deref(), Some("a"));
    assert_eq!(next_name(&mut scheduler), None);
    assert_eq!(scheduler.running(), 1);
}

#[test]
fn test_success_releases_dependents() {
    let graph = chain();
    let selection = select(&graph, &SelectionFilter::all(), |_| true).unwrap();
    let mut scheduler = Scheduler::new(&graph, &selection).unwrap();

    for expected in ["a", "b", "c"] {
        let name = next_name(&mut scheduler).unwrap();
        assert_eq!(name, expected);
        assert_eq!(next_name(&mut scheduler), None);
        scheduler.complete(&name, Ok(()));
    }

    assert!(scheduler.is_finished());
    assert_eq!(scheduler.dispatch_order(), &["a", "b", "c"]);
    let report = scheduler.into_report("noop".to_string(), Duration::ZERO);
    assert!(report.success());
    assert_eq!(report.succeeded(), vec!["a", "b", "c"]);
}

#[test]
fn test_waits_for_every_dependency() {
    let graph = PackageGraph::new(vec![
        pkg("left", &[]),
        pkg("right", &[]),
        pkg("top", &["left", "right"]),
    ])
    .unwrap();
    let selection = select(&graph, &SelectionFilter::all(), |_| true).unwrap();
    let mut scheduler = Scheduler::new(&graph, &selection).unwrap();

    assert_eq!(next_name(&mut scheduler).as_deref(), Some("left"));
    assert_eq!(next_name(&mut scheduler).as_deref(), Some("right"));
    scheduler.complete("left", Ok(()));
    assert_eq!(scheduler.state("top"), Some(PackageState::Pending));
    scheduler.complete("right", Ok(()));
    assert_eq!(scheduler.state("top"), Some(PackageState::Ready));
}

#[test]
fn test_failure_skips_transitive_dependents() {
    let graph = PackageGraph::new(vec![
        pkg("a", &[]),
        pkg("b", &["a"]),
        pkg("c", &["b"]),
        pkg("other", &[]),
    ])
    .unwrap();
    let selection = select(&graph, &SelectionFilter::all(), |_| true).unwrap();
    let mut scheduler = Scheduler::new(&graph, &selection).unwrap();

    assert_eq!(next_name(&mut scheduler).as_deref(), Some("a"));
    scheduler.complete("a", Err("boom".to_string()));

    assert_eq!(scheduler.state("b"), Some(PackageState::Skipped));
    assert_eq!(scheduler.state("c"), Some(PackageState::Skipped));
    assert!(scheduler.state("c").unwrap().is_terminal());
    assert!(!scheduler.state("other").unwrap().is_terminal());
    assert_eq!(next_name(&mut scheduler).as_deref(), Some("other"));
    scheduler.complete("other", Ok(()));
    assert!(scheduler.is_finished());

    let report = scheduler.into_report("noop".to_string(), Duration::ZERO);
    assert!(!report.success());
    assert_eq!(report.failed(), vec![("a", "boom")]);
    let culprit = SkipReason::UpstreamFailed {
        culprit: "a".to_string(),
    };
    assert_eq!(report.outcome("c"), Some(&Outcome::Skipped(culprit)));
    assert_eq!(report.outcome("other"), Some(&Outcome::Succeeded));
}

#[test]
fn test_bail_halts_independent_branches() {
    let graph = PackageGraph::new(vec![pkg("a", &[]), pkg("b", &[]), pkg("c", &["b"])]).unwrap();
    let selection = select(&graph, &SelectionFilter::all(), |_| true).unwrap();
    let mut scheduler = Scheduler::new(&graph, &selection).unwrap().with_bail(true);

    assert_eq!(next_name(&mut scheduler).as_deref(), Some("a"));
    assert_eq!(next_name(&mut scheduler).as_deref(), Some("b"));
    scheduler.complete("a", Err("boom".to_string()));

    assert!(scheduler.is_halted());
    assert_eq!(next_name(&mut scheduler), None);
    assert_eq!(scheduler.state("b"), Some(PackageState::Running));
    assert_eq!(scheduler.state("c"), Some(PackageState::Skipped));

    scheduler.complete("b", Ok(()));
    assert!(scheduler.is_finished());

    let report = scheduler.into_report("noop".to_string(), Duration::ZERO);
    assert_eq!(report.outcome("b"), Some(&Outcome::Succeeded));
    assert_eq!(report.outcome("c"), Some(&Outcome::Skipped(SkipReason::Aborted)));
}

#[test]
fn test_barriers_keep_ordering_without_running() {
    let graph = chain();
    let selection = select(&graph, &SelectionFilter::all(), |p| p.name != "b").unwrap();
    let mut scheduler = Scheduler::new(&graph, &selection).unwrap();

    assert_eq!(next_name(&mut scheduler).as_deref(), Some("a"));
    assert_eq!(scheduler.state("c"), Some(PackageState::Pending));
    scheduler.complete("a", Ok(()));

    assert_eq!(scheduler.state("b"), Some(PackageState::Succeeded));
    assert_eq!(next_name(&mut scheduler).as_deref(), Some("c"));
    scheduler.complete("c", Ok(()));

    assert_eq!(scheduler.dispatch_order(), &["a", "c"]);
    let report = scheduler.into_report("noop".to_string(), Duration::ZERO);
    assert_eq!(report.len(), 2);
    assert!(report.outcome("b").is_none());
}

#[test]
fn test_failure_propagates_through_barriers() {
    let graph = chain();
    let selection = select(&graph, &SelectionFilter::all(), |p| p.name != "b").unwrap();
    let mut scheduler = Scheduler::new(&graph, &selection).unwrap();

    next_name(&mut scheduler);
    scheduler.complete("a", Err("boom".to_string()));

    assert_eq!(scheduler.state("c"), Some(PackageState::Skipped));
    assert!(scheduler.is_finished());
}

#[test]
fn test_unscheduled_dependencies_are_ignored() {
    let graph = chain();
    let filter = SelectionFilter::new(&["^c$"], &[]).unwrap();
    let selection = select(&graph, &filter, |_| true).unwrap();
    let mut scheduler = Scheduler::new(&graph, &selection).unwrap();

    assert_eq!(next_name(&mut scheduler).as_deref(), Some("c"));
}

#[test]
fn test_stray_completions_are_ignored() {
    let graph = chain();
    let selection = select(&graph, &SelectionFilter::all(), |_| true).unwrap();
    let mut scheduler = Scheduler::new(&graph, &selection).unwrap();

    scheduler.complete("b", Ok(()));
    scheduler.complete("missing", Ok(()));
    assert_eq!(scheduler.state("b"), Some(PackageState::Pending));
    assert_eq!(scheduler.running(), 0);
}

#[test]
fn test_cycle_is_rejected() {
    let graph = PackageGraph::new(vec![pkg("a", &["b"]), pkg("b", &["a"])]).unwrap();
    let selection = select(&graph, &SelectionFilter::all(), |_| true).unwrap();

    let err = Scheduler::new(&graph, &selection).unwrap_err();
    assert!(err.to_string().contains("a -> b -> a"));
}

#[test]
fn test_cycle_outside_selection_is_ignored() {
    let graph =
        PackageGraph::new(vec![pkg("leaf", &[]), pkg("x", &["y"]), pkg("y", &["x"])]).unwrap();
    let filter = SelectionFilter::new(&["^leaf$"], &[]).unwrap();
    let selection = select(&graph, &filter, |_| true).unwrap();

    let mut scheduler = Scheduler::new(&graph, &selection).unwrap();
    assert_eq!(next_name(&mut scheduler).as_deref(), Some("leaf"));
    scheduler.complete("leaf", Ok(()));
    assert!(scheduler.is_finished());
}
