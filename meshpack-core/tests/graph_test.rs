use std::collections::BTreeSet;

use meshpack_core::graph::{EdgeKind, PackageGraph};
use meshpack_core::package::Package;

fn pkg(name: &str, deps: &[&str]) -> Package {
    Package::new(
        name,
        format!("/workspace/packages/{}", name),
        deps.iter().map(|d| d.to_string()).collect(),
    )
}

fn create_test_packages() -> Vec<Package> {
    vec![
        pkg("pkg-a", &[]),
        pkg("pkg-b", &["pkg-a"]),
        pkg("pkg-c", &["pkg-b"]),
    ]
}

fn names(packages: &[&Package]) -> BTreeSet<String> {
    packages.iter().map(|p| p.name.clone()).collect()
}

#[test]
fn test_dependents_are_filled_in() {
    let graph = PackageGraph::new(create_test_packages()).unwrap();

    let a = graph.get_package("pkg-a").unwrap();
    assert_eq!(a.local_dependents.len(), 1);
    assert!(a.local_dependents.contains("pkg-b"));

    let c = graph.get_package("pkg-c").unwrap();
    assert!(c.local_dependents.is_empty());
}

#[test]
fn test_edges_are_mutual_inverses() {
    let graph = PackageGraph::new(vec![
        pkg("a", &[]),
        pkg("b", &["a"]),
        pkg("c", &["a", "b"]),
        pkg("d", &["c"]),
    ])
    .unwrap();

    for package in graph.packages() {
        for dep in &package.local_dependencies {
            let dependency = graph.get_package(dep).unwrap();
            assert!(dependency.local_dependents.contains(&package.name));
        }
        for dependent in &package.local_dependents {
            let dependent = graph.get_package(dependent).unwrap();
            assert!(dependent.local_dependencies.contains(&package.name));
        }
    }
}

#[test]
fn test_dependencies_and_dependents() {
    let graph = PackageGraph::new(create_test_packages()).unwrap();

    assert_eq!(graph.dependencies("pkg-b").unwrap(), vec!["pkg-a"]);
    assert!(graph.dependencies("pkg-a").unwrap().is_empty());
    assert_eq!(graph.dependents("pkg-a").unwrap(), vec!["pkg-b"]);
    assert!(graph.dependents("pkg-c").unwrap().is_empty());
    assert!(graph.dependents("missing").is_err());
}

#[test]
fn test_closure_dependents() {
    let graph = PackageGraph::new(create_test_packages()).unwrap();

    let closure = graph.closure("pkg-a", EdgeKind::Dependents).unwrap();
    assert_eq!(closure.len(), 3);
    assert_eq!(
        names(&closure),
        ["pkg-a", "pkg-b", "pkg-c"].iter().map(|s| s.to_string()).collect()
    );
}

#[test]
fn test_closure_dependencies_includes_root() {
    let graph = PackageGraph::new(create_test_packages()).unwrap();

    let closure = graph.closure("pkg-b", EdgeKind::Dependencies).unwrap();
    assert_eq!(
        names(&closure),
        ["pkg-a", "pkg-b"].iter().map(|s| s.to_string()).collect()
    );

    let leaf = graph.closure("pkg-a", EdgeKind::Dependencies).unwrap();
    assert_eq!(leaf.len(), 1);
    assert_eq!(leaf[0].name, "pkg-a");
}

#[test]
fn test_closure_diamond_has_no_duplicates() {
    let graph = PackageGraph::new(vec![
        pkg("base", &[]),
        pkg("left", &["base"]),
        pkg("right", &["base"]),
        pkg("top", &["left", "right"]),
    ])
    .unwrap();

    let closure = graph.closure("base", EdgeKind::Dependents).unwrap();
    assert_eq!(closure.len(), 4);
    assert_eq!(names(&closure).len(), 4);
}

#[test]
fn test_closure_terminates_on_cycle() {
    let graph =
        PackageGraph::new(vec![pkg("a", &["b"]), pkg("b", &["c"]), pkg("c", &["a"])]).unwrap();

    let closure = graph.closure("a", EdgeKind::Dependencies).unwrap();
    assert_eq!(closure.len(), 3);
}

#[test]
fn test_closure_within_respects_predicate() {
    let graph = PackageGraph::new(create_test_packages()).unwrap();

    let closure = graph
        .closure_within("pkg-a", EdgeKind::Dependents, |name| name != "pkg-b")
        .unwrap();
    assert_eq!(closure.len(), 1);
    assert_eq!(closure[0].name, "pkg-a");
}

#[test]
fn test_closure_unknown_root() {
    let graph = PackageGraph::new(create_test_packages()).unwrap();
    let err = graph.closure("nope", EdgeKind::Dependents).unwrap_err();
    assert!(err.to_string().contains("Package not found: nope"));
}

#[test]
fn test_topological_order() {
    let graph = PackageGraph::new(vec![
        pkg("pkg-c", &["pkg-b"]),
        pkg("pkg-b", &["pkg-a"]),
        pkg("pkg-a", &[]),
        pkg("other", &[]),
    ])
    .unwrap();

    let order = graph.topological_order().unwrap();
    assert_eq!(order, vec!["other", "pkg-a", "pkg-b", "pkg-c"]);
}

#[test]
fn test_circular_dependency_reports_cycle() {
    let graph = PackageGraph::new(vec![
        pkg("pkg-a", &["pkg-b"]),
        pkg("pkg-b", &["pkg-a"]),
        pkg("pkg-c", &[]),
    ])
    .unwrap();

    let err = graph.check_acyclic().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Circular dependency"));
    assert!(message.contains("pkg-a -> pkg-b -> pkg-a"));
    assert!(graph.topological_order().is_err());
}

#[test]
fn test_cycle_check_within_subset() {
    let graph = PackageGraph::new(vec![
        pkg("leaf", &[]),
        pkg("x", &["y"]),
        pkg("y", &["x"]),
        pkg("z", &["x"]),
    ])
    .unwrap();

    assert!(graph.check_acyclic_within(|name| name == "leaf").is_ok());
    assert!(graph.check_acyclic_within(|name| name != "y").is_ok());

    let err = graph
        .check_acyclic_within(|name| ["x", "y", "z"].contains(&name))
        .unwrap_err();
    assert!(err.to_string().contains("x -> y -> x"));
    assert!(graph.check_acyclic().is_err());
}

#[test]
fn test_acyclic_graph_passes_check() {
    let graph = PackageGraph::new(create_test_packages()).unwrap();
    assert!(graph.check_acyclic().is_ok());
}

#[test]
fn test_dangling_dependency_is_rejected() {
    let result = PackageGraph::new(vec![pkg("pkg-a", &["ghost"])]);
    let err = result.unwrap_err();
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn test_self_dependency_is_rejected() {
    let result = PackageGraph::new(vec![pkg("pkg-a", &["pkg-a"])]);
    assert!(result.unwrap_err().to_string().contains("depends on itself"));
}

#[test]
fn test_duplicate_package_is_rejected() {
    let result = PackageGraph::new(vec![pkg("pkg-a", &[]), pkg("pkg-a", &[])]);
    assert!(result.is_err());
}
