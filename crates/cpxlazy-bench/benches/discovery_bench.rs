//! Discovery-side costs: version parsing and candidate assembly.

use std::time::Duration;

use cpxlazy_core::candidates::{CandidatePlan, order_newest_first};
use cpxlazy_core::version::parse_version_string;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

fn install_tree_matches() -> Vec<String> {
    ["12.6.3", "12.10", "12.7.1", "20.1.0", "12.9", "22.1.1", "12.8"]
        .iter()
        .map(|v| format!("/opt/ibm/ILOG/CPLEX_Studio{v}/cplex/bin/x86-64_linux/libcplex.so"))
        .collect()
}

fn bench_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery");

    for input in ["12.6.0.0", "22.1.1.0", " 12.10.3.99 "] {
        group.bench_function(BenchmarkId::new("parse_version", input.trim()), |b| {
            b.iter(|| parse_version_string(black_box(input)));
        });
    }

    let matches = install_tree_matches();
    group.bench_function("order_newest_first", |b| {
        b.iter(|| {
            let mut paths = matches.clone();
            order_newest_first(&mut paths);
            black_box(paths)
        });
    });

    let plan = CandidatePlan::new(
        None,
        &["libcplex.so"],
        &["/opt/ibm/ILOG/CPLEX_Studio*/cplex/bin/x86-64_linux/libcplex*.so"],
    );
    group.bench_function("assemble", |b| {
        b.iter(|| black_box(plan.assemble(|_| matches.clone())));
    });

    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(1))
        .measurement_time(Duration::from_secs(2));
    targets = bench_discovery
);
criterion_main!(benches);
