//! Benchmarks du décodage PGM et du rééchantillonnage bilinéaire.
//!
//! Run with: cargo bench -p gs-source

use std::fmt::Write as _;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gs_core::grid::LuminanceGrid;
use gs_source::pgm::decode_str;
use gs_source::resize::{resample, resample_by};

/// Diagonal gradient, every value in `0..=254`.
fn gradient(width: usize, height: usize) -> LuminanceGrid {
    let data = (0..width * height)
        .map(|i| ((i % width + i / width) % 255) as u8)
        .collect();
    LuminanceGrid::from_raw(width, height, data).unwrap_or_else(|_| LuminanceGrid::new(0, 0))
}

fn plain_raster(width: usize, height: usize) -> String {
    let mut out = format!("P2\n{width} {height}\n255\n");
    for (i, v) in gradient(width, height).as_slice().iter().enumerate() {
        let sep = if (i + 1) % 17 == 0 { '\n' } else { ' ' };
        let _ = write!(out, "{v}{sep}");
    }
    out
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("pgm_decode");
    for (w, h) in [(320, 240), (1920, 1080)] {
        let raster = plain_raster(w, h);
        group.throughput(Throughput::Bytes(raster.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{w}x{h}")), &raster, |b, r| {
            b.iter(|| decode_str(black_box(r)));
        });
    }
    group.finish();
}

fn bench_resample(c: &mut Criterion) {
    let src = gradient(1920, 1080);
    let mut group = c.benchmark_group("resample_1920x1080");
    for scale in [1.5f32, 2.0, 4.0, 8.0] {
        group.bench_with_input(BenchmarkId::from_parameter(scale), &scale, |b, &s| {
            b.iter(|| resample_by(black_box(&src), s));
        });
    }
    group.finish();

    c.bench_function("resample_upscale_x2", |b| {
        let small = gradient(320, 240);
        b.iter(|| resample(black_box(&small), 640, 480));
    });
}

criterion_group!(benches, bench_decode, bench_resample);
criterion_main!(benches);
