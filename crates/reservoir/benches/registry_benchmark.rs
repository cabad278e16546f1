//! # Registry Drain Benchmark
//!
//! Cost of queueing and draining a tick's worth of deferred requests
//! through the mock runtime.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use reservoir::mock::{MockPrefab, MockRuntime};
use reservoir::{runtime_handle, PoolConfig, PoolRegistry, RegistryConfig};

const REQUESTS_PER_TICK: usize = 256;

fn bench_drain(c: &mut Criterion) {
    let config = RegistryConfig {
        default_pool: PoolConfig {
            initial_size: REQUESTS_PER_TICK,
            ..PoolConfig::default()
        },
        ..RegistryConfig::default()
    };
    let mut registry = PoolRegistry::new(runtime_handle(MockRuntime::default()), config);
    let prefabs: Vec<_> = (0..4)
        .map(|key| MockPrefab::new(key, &format!("Prefab{key}")))
        .collect();

    c.bench_function("registry_drain_256_recycle_deactivate", |b| {
        b.iter(|| {
            for i in 0..REQUESTS_PER_TICK {
                let prefab = prefabs[i % prefabs.len()].clone();
                registry.request_recycle_then(&prefabs[i % prefabs.len()], move |registry, id| {
                    if let Some(id) = id {
                        registry.request_deactivation(&prefab, id);
                    }
                });
            }
            black_box(registry.drain())
        });
    });
}

fn bench_immediate(c: &mut Criterion) {
    let mut registry =
        PoolRegistry::new(runtime_handle(MockRuntime::default()), RegistryConfig::default());
    let prefab = MockPrefab::new(1, "Bullet");

    c.bench_function("registry_immediate_recycle_deactivate", |b| {
        b.iter(|| {
            if let Some(id) = registry.recycle(&prefab) {
                let _ = registry.deactivate(&prefab, id);
            }
        });
    });
}

criterion_group!(benches, bench_drain, bench_immediate);
criterion_main!(benches);
