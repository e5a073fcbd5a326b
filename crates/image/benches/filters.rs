//! Benchmarks for the phase filters.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};
use medphase_image::{detect_format, ContrastEnhancer, GaussianSmoother, PhaseFilter};

fn sample_scan() -> RgbImage {
    RgbImage::from_fn(512, 512, |x, y| {
        let v = 90 + ((x * 7 + y * 13) % 60) as u8;
        Rgb([v, v, v.saturating_add(5)])
    })
}

fn bench_format_detection(c: &mut Criterion) {
    let png_data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];

    c.bench_function("detect_png", |b| {
        b.iter(|| detect_format(black_box(&png_data)))
    });
}

fn bench_filters(c: &mut Criterion) {
    let scan = sample_scan();
    let clahe = ContrastEnhancer::default();
    let gaussian = GaussianSmoother::default();

    c.bench_function("clahe_512", |b| b.iter(|| clahe.apply(black_box(&scan))));
    c.bench_function("gaussian_15x15_512", |b| b.iter(|| gaussian.apply(black_box(&scan))));
}

criterion_group!(benches, bench_format_detection, bench_filters);
criterion_main!(benches);
