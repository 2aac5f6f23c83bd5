use criterion::{black_box, criterion_group, criterion_main, Criterion};
use meshpack_core::graph::{EdgeKind, PackageGraph};
use meshpack_core::package::Package;
use meshpack_core::scanner::Scanner;
use meshpack_core::selection::{select, SelectionFilter};
use tempfile::TempDir;

fn generate_packages(count: usize, deps_per_package: usize) -> Vec<Package> {
    (0..count)
        .map(|i| {
            let deps = (0..deps_per_package.min(i))
                .map(|j| format!("package-{}", i - 1 - j))
                .collect();
            let package = Package::new(
                format!("package-{}", i),
                format!("packages/package-{}", i),
                deps,
            );
            if i % 2 == 0 {
                package.with_script("build", "tsc")
            } else {
                package
            }
        })
        .collect()
}

fn benchmark_graph_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_construction");

    for count in [100, 500, 1000, 5000] {
        group.bench_function(format!("{}_packages", count), |b| {
            let packages = generate_packages(count, 3);
            b.iter(|| black_box(PackageGraph::new(packages.clone()).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_closure(c: &mut Criterion) {
    let mut group = c.benchmark_group("closure");

    for count in [100, 500, 1000, 5000] {
        let graph = PackageGraph::new(generate_packages(count, 3)).unwrap();

        group.bench_function(format!("dependents_{}_packages", count), |b| {
            b.iter(|| black_box(graph.closure("package-0", EdgeKind::Dependents).unwrap()));
        });
        let last = format!("package-{}", count - 1);
        group.bench_function(format!("dependencies_{}_packages", count), |b| {
            b.iter(|| black_box(graph.closure(&last, EdgeKind::Dependencies).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");

    for count in [100, 500, 1000, 5000] {
        let graph = PackageGraph::new(generate_packages(count, 3)).unwrap();
        let filter = SelectionFilter::new(&["-1[0-9]$"], &[])
            .unwrap()
            .with_dependents(true);

        group.bench_function(format!("{}_packages", count), |b| {
            b.iter(|| black_box(select(&graph, &filter, |p| p.has_script("build")).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_topological_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("topological_order");

    for count in [100, 500, 1000, 5000] {
        let graph = PackageGraph::new(generate_packages(count, 3)).unwrap();

        group.bench_function(format!("{}_packages", count), |b| {
            b.iter(|| black_box(graph.topological_order().unwrap()));
        });
    }

    group.finish();
}

fn benchmark_scanner(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanner");

    for count in [50, 200, 1000] {
        let temp_dir = TempDir::new().unwrap();
        let packages_dir = temp_dir.path().join("packages");

        for i in 0..count {
            let package_dir = packages_dir.join(format!("package-{}", i));
            std::fs::create_dir_all(&package_dir).unwrap();
            let dependency = if i > 0 {
                format!(r#""package-{}": "*""#, i - 1)
            } else {
                String::new()
            };
            let manifest = format!(
                r#"{{ "name": "package-{}", "version": "1.0.0", "dependencies": {{ {} }} }}"#,
                i, dependency
            );
            std::fs::write(package_dir.join("package.json"), manifest).unwrap();
        }

        group.bench_function(format!("scan_{}_packages", count), |b| {
            b.iter(|| black_box(Scanner::new(&packages_dir).scan().unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_graph_construction,
    benchmark_closure,
    benchmark_selection,
    benchmark_topological_order,
    benchmark_scanner
);
criterion_main!(benches);
