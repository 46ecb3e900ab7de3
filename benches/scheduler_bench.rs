//! Benchmarks for the job scheduler.
//!
//! Benchmarks cover:
//! - Graph build + kick + wait for independent fan-out
//! - Dependency-chain completion (edge accounting on the hot path)
//! - Scratch arena reuse across repeated graphs

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use jobgraph::{Counter, Scheduler, SchedulerConfig};

fn bench_scheduler() -> Scheduler {
    Scheduler::new(
        SchedulerConfig::new()
            .with_num_threads(4)
            .with_scratch_bytes(4 * 1024 * 1024),
    )
    .expect("scheduler init")
}

// ============================================================================
// Fan-out: N independent jobs, one counter
// ============================================================================

fn bench_fanout(c: &mut Criterion) {
    let sch = bench_scheduler();
    let mut group = c.benchmark_group("fanout_kick_wait");

    for &n in &[16u32, 64, 256] {
        group.throughput(Throughput::Elements(u64::from(n)));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                sch.reset().unwrap();
                let counter = Counter::new();
                for i in 0..n {
                    sch.create_job_with_counter(&counter, move || {
                        black_box(i);
                    })
                    .unwrap();
                }
                sch.kick().unwrap();
                counter.wait();
            });
        });
    }
    group.finish();
}

// ============================================================================
// Chain: N jobs in a straight dependency line
// ============================================================================

fn bench_chain(c: &mut Criterion) {
    let sch = bench_scheduler();
    let mut group = c.benchmark_group("chain_kick_wait");

    for &n in &[16u32, 64, 256] {
        group.throughput(Throughput::Elements(u64::from(n)));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                sch.reset().unwrap();
                let mut prev = None;
                for i in 0..n {
                    let job = sch
                        .create_job(move || {
                            black_box(i);
                        })
                        .unwrap();
                    if let Some(prev) = prev {
                        sch.depend(job, prev).unwrap();
                    }
                    prev = Some(job);
                }
                sch.kick().unwrap();
                sch.wait(prev.unwrap()).unwrap();
            });
        });
    }
    group.finish();
}

// ============================================================================
// Build-only: arena allocation throughput without dispatch
// ============================================================================

fn bench_build_reset(c: &mut Criterion) {
    let sch = bench_scheduler();
    let mut group = c.benchmark_group("build_reset");

    group.throughput(Throughput::Elements(1024));
    group.bench_function("create_1024_groups", |b| {
        b.iter(|| {
            sch.reset().unwrap();
            for _ in 0..1024 {
                black_box(sch.create_group().unwrap());
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_fanout, bench_chain, bench_build_reset);
criterion_main!(benches);
