//! Benchmarks for spawn, read, and drain costs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strand::prelude::*;

fn bench_spawn_and_get(c: &mut Criterion) {
    let manager = TaskManager::new();

    c.bench_function("spawn_and_get", |b| {
        b.iter(|| manager.spawn(|| black_box(21 * 2)).get().unwrap());
    });
}

fn bench_spawn_with_result(c: &mut Criterion) {
    let manager = TaskManager::new();

    c.bench_function("spawn_with_result", |b| {
        b.iter(|| manager.spawn_with_result(black_box(42)).get().unwrap());
    });
}

fn bench_fan_out_wait_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out_wait_all");
    let manager = TaskManager::new();

    for tasks in [1usize, 8, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(tasks), &tasks, |b, &tasks| {
            b.iter(|| {
                for i in 0..tasks {
                    let _ = manager.spawn(move || black_box(i));
                }
                manager.wait_all();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_spawn_and_get,
    bench_spawn_with_result,
    bench_fan_out_wait_all
);
criterion_main!(benches);
