//! Benchmarks for frame scoring.
//!
//! Run with: cargo bench

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use stillpick::quality;

fn noise_frame(width: u32, height: u32) -> GrayImage {
    // Cheap deterministic texture with plenty of edges.
    GrayImage::from_fn(width, height, |x, y| {
        Luma([((x.wrapping_mul(31) ^ y.wrapping_mul(17)) & 0xff) as u8])
    })
}

fn benchmark_laplacian_variance(criterion: &mut Criterion) {
    let frame_720p = noise_frame(1280, 720);
    let frame_1080p = noise_frame(1920, 1080);

    criterion.bench_function("laplacian variance 720p", |bencher| {
        bencher.iter(|| quality::laplacian_variance(black_box(&frame_720p)));
    });

    criterion.bench_function("laplacian variance 1080p", |bencher| {
        bencher.iter(|| quality::laplacian_variance(black_box(&frame_1080p)));
    });
}

fn benchmark_full_score(criterion: &mut Criterion) {
    let rgb = DynamicImage::ImageRgb8(RgbImage::from_fn(1920, 1080, |x, y| {
        image::Rgb([(x & 0xff) as u8, (y & 0xff) as u8, ((x + y) & 0xff) as u8])
    }));

    criterion.bench_function("score 1080p rgb frame", |bencher| {
        bencher.iter(|| quality::score(black_box(&rgb)).unwrap());
    });
}

criterion_group!(benches, benchmark_laplacian_variance, benchmark_full_score);
criterion_main!(benches);
