//! Criterion benchmarks for the per-frame particle step.
//!
//! Run with:
//!   cargo bench -p vramsim
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use vramsim::metrics::KvFootprint;
use vramsim::particles::{ParticleField, Vec2};
use vramsim::prelude::{Catalog, Precision};
use vramsim::prng::Prng;

fn make_field(count: usize, seed: u64) -> ParticleField {
    let lanes = (0..8).map(|i| 80.0 + i as f64 * 20.0).collect();
    let mut field = ParticleField::new(175.0, 625.0, lanes);
    let mut rng = Prng::new(seed);
    for i in 0..count {
        if i % 2 == 0 {
            field.spawn_bus(
                Vec2::new(625.0, 150.0),
                Vec2::new(175.0, 100.0),
                "#ef4444",
                3.0,
                &mut rng,
            );
        } else {
            field.spawn_direct(
                Vec2::new(700.0, 50.0),
                Vec2::new(700.0, -10.0),
                "#60a5fa",
                4.0,
                Some("token".to_string()),
            );
        }
    }
    field
}

/// One frame of particle motion at different populations.
fn bench_step_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("particle_step");

    for size in [16usize, 64, 256, 1024].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_batched(
                || make_field(size, 42),
                |mut field| black_box(field.step(0.18).len()),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Footprint recomputation, which every rendered frame performs.
fn bench_footprint(c: &mut Criterion) {
    let catalog = Catalog::builtin();
    let model = catalog.pipeline_model("deepseek-v3").cloned();
    let Ok(model) = model else {
        return;
    };
    let Some(arch) = model.arch else {
        return;
    };

    c.bench_function("kv_footprint", |b| {
        let mut tokens = 0u64;
        b.iter(|| {
            tokens = (tokens + 1) % 4096;
            let f = KvFootprint::new(&arch, model.params_b, Precision::Int4, tokens, 141.0);
            black_box(f.overflow())
        });
    });
}

criterion_group!(benches, bench_step_sizes, bench_footprint);
criterion_main!(benches);
