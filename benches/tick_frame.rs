//! Per-tick compositor benchmarks at the full output resolution.
//! Run: cargo bench

use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kaleido::engine::MutationEngine;
use kaleido::manifest::{engine_from_manifest, load_and_validate_manifest};

fn bench_tick_loaded(c: &mut Criterion) {
    let manifest_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/gallery.yaml");
    let manifest = load_and_validate_manifest(&manifest_path).expect("load manifest");
    let mut engine = engine_from_manifest(&manifest).expect("create engine");
    for outcome in engine.wait_for_pending_loads() {
        outcome.result.expect("demo image should decode");
    }

    let mut group = c.benchmark_group("tick_loaded");
    group.sample_size(30);

    group.bench_function("both_channels_loaded_2560x1440", |b| {
        b.iter(|| {
            engine.tick();
            black_box(engine.buffer(0).expect("buffer").pixmap().data().len())
        });
    });

    group.finish();
}

fn bench_tick_imageless(c: &mut Criterion) {
    let mut engine = MutationEngine::new();

    let mut group = c.benchmark_group("tick_imageless");
    group.sample_size(50);

    group.bench_function("both_channels_imageless_2560x1440", |b| {
        b.iter(|| {
            engine.tick();
            black_box(engine.buffer(1).expect("buffer").pixmap().data().len())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_tick_loaded, bench_tick_imageless);
criterion_main!(benches);
