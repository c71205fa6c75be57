//! Throughput Benchmark for JunoKV
//!
//! This benchmark measures the performance of a single store and of the
//! command handler under various workloads.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use junokv::storage::{sweep_pass, unix_now, FieldMap, Store};
use std::sync::Arc;

/// Benchmark scalar SET operations
fn bench_set(c: &mut Criterion) {
    let store = Arc::new(Store::new("0"));

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            store.set(&format!("key:{}", i), "small_value".to_string()).unwrap();
            i += 1;
        });
    });

    group.bench_function("set_medium", |b| {
        let mut i = 0u64;
        let value = "x".repeat(1024); // 1KB value
        b.iter(|| {
            store.set(&format!("key:{}", i), value.clone()).unwrap();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark scalar GET operations
fn bench_get(c: &mut Criterion) {
    let store = Arc::new(Store::new("0"));

    for i in 0..10_000 {
        store.set(&format!("key:{}", i), format!("value:{}", i)).unwrap();
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 10_000);
            black_box(store.get(&key).unwrap());
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("missing:{}", i);
            black_box(store.get(&key).is_err());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark mixed workload (80% reads, 20% writes)
fn bench_mixed(c: &mut Criterion) {
    let store = Arc::new(Store::new("0"));

    for i in 0..10_000 {
        store.set(&format!("key:{}", i), format!("value:{}", i)).unwrap();
    }

    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Elements(1));

    group.bench_function("80_read_20_write", |b| {
        let mut i = 0u64;
        b.iter(|| {
            if i % 5 == 0 {
                store.set(&format!("new:{}", i), "value".to_string()).unwrap();
            } else {
                let key = format!("key:{}", i % 10_000);
                black_box(store.get(&key).ok());
            }
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark in-place list and map updates
fn bench_updates(c: &mut Criterion) {
    let store = Arc::new(Store::new("0"));
    store
        .lset("list", (0..1_000).map(|i| i.to_string()).collect())
        .unwrap();
    store.hset("map", FieldMap::new()).unwrap();

    let mut group = c.benchmark_group("updates");
    group.throughput(Throughput::Elements(1));

    group.bench_function("lupdate", |b| {
        let mut i = 0i64;
        b.iter(|| {
            store.lupdate("list", i % 1_000, "x".to_string()).unwrap();
            i += 1;
        });
    });

    group.bench_function("hupdate", |b| {
        let mut i = 0u64;
        b.iter(|| {
            store
                .hupdate("map", format!("field:{}", i % 1_000), "x".to_string())
                .unwrap();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark a full sweep pass over keys that all carry a TTL
fn bench_sweep(c: &mut Criterion) {
    let store = Arc::new(Store::new("0"));

    for i in 0..10_000 {
        let key = format!("expire:{}", i);
        store.set(&key, "value".to_string()).unwrap();
        store.expire(&key, 3600).unwrap();
    }

    let mut group = c.benchmark_group("expiry");

    group.bench_function("sweep_pass_nothing_due", |b| {
        b.iter(|| {
            black_box(sweep_pass(&store, unix_now()));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_mixed,
    bench_updates,
    bench_sweep,
);

criterion_main!(benches);
