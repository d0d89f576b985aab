// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the negframe-frame crate: the full extraction
// pipeline and the highlight normalizer on synthetic scans.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use negframe_frame::FrameExtractor;
use negframe_frame::frame::normalize_highlights;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Square scan with a white perforation border, a warm rebate and a dark
/// content square tilted clockwise by 4°.
fn synthetic_scan(size: u32) -> RgbImage {
    let border = size / 50;
    let mut img = RgbImage::from_fn(size, size, |x, y| {
        if x < border || y < border || x >= size - border || y >= size - border {
            Rgb([255, 255, 255])
        } else {
            Rgb([235, 220, 205])
        }
    });
    let centre = size as f32 / 2.0;
    let half = size as f32 * 0.35;
    let (s, c) = 4f32.to_radians().sin_cos();
    let corners: Vec<Point<i32>> = [(-half, -half), (half, -half), (half, half), (-half, half)]
        .iter()
        .map(|&(x, y)| {
            Point::new(
                (centre + x * c - y * s).round() as i32,
                (centre + x * s + y * c).round() as i32,
            )
        })
        .collect();
    draw_polygon_mut(&mut img, &corners, Rgb([70, 60, 55]));
    img
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_extract(c: &mut Criterion) {
    let scan = synthetic_scan(600);
    let extractor = FrameExtractor::default();

    c.bench_function("extract (600x600)", |b| {
        b.iter(|| {
            let result = extractor.extract(black_box(&scan));
            black_box(result.map(|r| r.angle).unwrap_or_default());
        });
    });
}

fn bench_normalize(c: &mut Criterion) {
    let scan = synthetic_scan(1000);

    c.bench_function("normalize_highlights (1000x1000)", |b| {
        b.iter(|| black_box(normalize_highlights(black_box(&scan), 3.0)));
    });
}

criterion_group!(benches, bench_extract, bench_normalize);
criterion_main!(benches);
