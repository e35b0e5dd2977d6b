//! Route resolution benchmarks.
//!
//! Run with: `cargo bench -p bamboo-router`

use bamboo_router::RouteTable;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn build_table(num_routes: usize) -> RouteTable<String> {
    let mut table = RouteTable::new();

    for i in 0..num_routes / 3 {
        table
            .register(&format!("/resource{i}/list"), format!("list{i}"))
            .expect("static route");
    }

    for i in 0..num_routes / 3 {
        table
            .register(&format!("/resource{i}/{{id:int}}"), format!("get{i}"))
            .expect("param route");
    }

    for i in 0..num_routes / 3 {
        table
            .register(
                &format!("/{{org}}/resource{i}/{{rest:path}}"),
                format!("org{i}"),
            )
            .expect("dynamic route");
    }

    table
}

fn bench_static_match(c: &mut Criterion) {
    let table = build_table(100);

    c.bench_function("static_match", |b| {
        b.iter(|| black_box(table.resolve("/resource20/list")));
    });
}

fn bench_int_match(c: &mut Criterion) {
    let table = build_table(100);

    c.bench_function("int_match", |b| {
        b.iter(|| black_box(table.resolve("/resource25/12345")));
    });
}

fn bench_dynamic_first_match(c: &mut Criterion) {
    let table = build_table(100);

    c.bench_function("dynamic_first_match", |b| {
        b.iter(|| black_box(table.resolve("/acme-corp/resource10/a/b/c")));
    });
}

fn bench_miss(c: &mut Criterion) {
    let table = build_table(100);

    c.bench_function("miss", |b| {
        b.iter(|| black_box(table.resolve("/nonexistent")));
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for num_routes in [10, 50, 100, 500, 1000] {
        let table = build_table(num_routes);

        group.bench_with_input(
            BenchmarkId::new("static_match", num_routes),
            &num_routes,
            |b, &n| {
                let path = format!("/resource{}/list", n / 6);
                b.iter(|| black_box(table.resolve(&path)));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("int_match", num_routes),
            &num_routes,
            |b, &n| {
                let path = format!("/resource{}/12345", n / 6);
                b.iter(|| black_box(table.resolve(&path)));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_static_match,
    bench_int_match,
    bench_dynamic_first_match,
    bench_miss,
    bench_scaling
);
criterion_main!(benches);
