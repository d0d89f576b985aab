// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inner crop and skew detection — isolate the photographic content inside the
// rebate crop, measure its tilt, and sample the color of its brightest pixels.

use image::imageops::{crop_imm, invert};
use image::{GrayImage, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};
use negframe_core::config::InnerConfig;
use negframe_core::{Detection, FallbackReason, Rect, RgbColor};
use tracing::{debug, info, instrument, warn};

use super::contour::largest_external_contour;
use super::kernel_radius;
use crate::image::brightness::{compute_brightness, percentile, threshold_mask};

/// Output of [`detect_inner`].
#[derive(Debug, Clone)]
pub struct InnerCrop {
    /// Axis-aligned content crop (the whole rebate crop on fallback).
    pub image: RgbImage,
    /// Brightest `top_percent`% of `image` (255 = selected).
    pub bright_mask: GrayImage,
    /// Mean color under `bright_mask`.
    pub average_color: RgbColor,
    /// Content rectangle relative to the rebate crop, plus the raw skew angle.
    pub detection: Detection,
}

/// Locate the content region inside a rebate crop.
///
/// `threshold` must be the brightness threshold produced by the rebate
/// detector; it is reused here, not recomputed. Bright pixels are closed into
/// the rebate region, the mask is inverted and then cleaned with a close and an
/// open so the content becomes one solid blob. The largest external contour of
/// that blob gives the skew (minimum-area rectangle) and the axis-aligned crop.
#[instrument(skip(crop, params), fields(width = crop.width(), height = crop.height()))]
pub fn detect_inner(crop: &RgbImage, threshold: f32, params: &InnerConfig) -> InnerCrop {
    let (width, height) = crop.dimensions();

    let bright = threshold_mask(&compute_brightness(crop), threshold);
    let mut content = close(&bright, Norm::LInf, kernel_radius(params.close_kernel));
    invert(&mut content);
    let clean_radius = kernel_radius(params.clean_kernel);
    let content = open(
        &close(&content, Norm::LInf, clean_radius),
        Norm::LInf,
        clean_radius,
    );

    let Some(contour) = largest_external_contour(&content) else {
        warn!("No content contour found; keeping full rebate crop");
        return InnerCrop {
            image: crop.clone(),
            bright_mask: GrayImage::new(width, height),
            average_color: RgbColor::WHITE,
            detection: Detection::Fallback {
                rect: Rect::full(width, height),
                reason: FallbackReason::NoContour,
            },
        };
    };

    let angle = contour.skew_angle();
    let rect = contour.bounding_rect().clamp_to(width, height);
    info!(angle, %rect, area = contour.area, "Detected skew angle");

    let image = crop_imm(crop, rect.x, rect.y, rect.width, rect.height).to_image();
    let (bright_mask, average_color) = brightest_average(&image, params.top_percent);
    debug!(
        r = average_color.r,
        g = average_color.g,
        b = average_color.b,
        "Inner highlight color"
    );

    InnerCrop {
        image,
        bright_mask,
        average_color,
        detection: Detection::Detected { rect, angle },
    }
}

/// Mask and mean color of the brightest `top_percent`% of `image`.
fn brightest_average(image: &RgbImage, top_percent: f64) -> (GrayImage, RgbColor) {
    let brightness = compute_brightness(image);
    let Some(cutoff) = percentile(brightness.as_raw(), 100.0 - top_percent) else {
        return (GrayImage::new(image.width(), image.height()), RgbColor::WHITE);
    };
    let mask = threshold_mask(&brightness, cutoff);

    let mut sums = [0.0f64; 3];
    let mut count = 0usize;
    for (pixel, m) in image.pixels().zip(mask.pixels()) {
        if m.0[0] != 0 {
            for (sum, channel) in sums.iter_mut().zip(pixel.0) {
                *sum += channel as f64;
            }
            count += 1;
        }
    }
    // The cutoff is one of the values, so at least one pixel is selected.
    let n = count.max(1) as f64;
    (mask, RgbColor::from_channels(sums.map(|s| s / n)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::draw_polygon_mut;
    use imageproc::point::Point;

    const REBATE: Rgb<u8> = Rgb([254, 254, 254]);
    const CONTENT: Rgb<u8> = Rgb([60, 64, 70]);

    /// Bright frame with a `side` square of content rotated clockwise by `degrees`.
    fn rebate_with_content(size: u32, side: f32, degrees: f32) -> RgbImage {
        let mut img = RgbImage::from_pixel(size, size, REBATE);
        let c = size as f32 / 2.0;
        let (s, co) = degrees.to_radians().sin_cos();
        let h = side / 2.0;
        let corners: Vec<Point<i32>> = [(-h, -h), (h, -h), (h, h), (-h, h)]
            .iter()
            .map(|&(x, y)| {
                Point::new(
                    (c + x * co - y * s).round() as i32,
                    (c + x * s + y * co).round() as i32,
                )
            })
            .collect();
        draw_polygon_mut(&mut img, &corners, CONTENT);
        img
    }

    fn threshold_of(img: &RgbImage) -> f32 {
        percentile(compute_brightness(img).as_raw(), 90.0).unwrap()
    }

    #[test]
    fn axis_aligned_content_is_cropped() {
        let img = rebate_with_content(300, 180.0, 0.0);
        let inner = detect_inner(&img, threshold_of(&img), &InnerConfig::default());

        let Detection::Detected { rect, angle } = inner.detection else {
            panic!("expected a detection, got {:?}", inner.detection);
        };
        assert!(angle.abs() < 0.5, "angle {angle}");
        assert!(rect.x.abs_diff(60) <= 2 && rect.y.abs_diff(60) <= 2, "{rect}");
        assert!(rect.width.abs_diff(180) <= 3 && rect.height.abs_diff(180) <= 3, "{rect}");
        assert_eq!(inner.image.dimensions(), (rect.width, rect.height));
    }

    #[test]
    fn rotated_content_reports_skew() {
        for degrees in [5.0f32, -4.0, 10.0] {
            let img = rebate_with_content(500, 300.0, degrees);
            let inner = detect_inner(&img, threshold_of(&img), &InnerConfig::default());
            let angle = inner.detection.angle();
            assert!(
                (angle - degrees as f64).abs() < 1.0,
                "drawn at {degrees}, detected {angle}"
            );
            // Axis-aligned box of the tilted square is wider than the square.
            let expected = 300.0 * (degrees.abs().to_radians().cos() + degrees.abs().to_radians().sin());
            let rect = inner.detection.rect();
            // Cleaning with a square kernel shaves a few pixels off each corner.
            assert!((rect.width as f32 - expected).abs() < 12.0, "{rect} vs {expected}");
        }
    }

    #[test]
    fn content_spanning_full_width_is_detected() {
        // Film strip: rebate only above and below a frame tilted 3° that runs
        // off the left and right edges.
        let (s, c) = 3f32.to_radians().sin_cos();
        let img = RgbImage::from_fn(600, 400, |x, y| {
            let v = -(x as f32 - 300.0) * s + (y as f32 - 200.0) * c;
            if v.abs() < 120.0 { CONTENT } else { REBATE }
        });
        let inner = detect_inner(&img, threshold_of(&img), &InnerConfig::default());

        let Detection::Detected { rect, angle } = inner.detection else {
            panic!("expected a detection, got {:?}", inner.detection);
        };
        assert!((angle - 3.0).abs() < 1.0, "angle {angle}");
        assert_eq!((rect.x, rect.width), (0, 600), "{rect}");
        // Vertical extent of the tilted band is 240 / cos 3° + 600 · tan 3°.
        assert!(rect.height.abs_diff(272) <= 6, "{rect}");
        assert_eq!(inner.image.dimensions(), (rect.width, rect.height));
    }

    #[test]
    fn all_bright_crop_falls_back() {
        let img = RgbImage::from_pixel(80, 60, REBATE);
        let inner = detect_inner(&img, threshold_of(&img), &InnerConfig::default());

        assert_eq!(
            inner.detection,
            Detection::Fallback {
                rect: Rect::full(80, 60),
                reason: FallbackReason::NoContour,
            }
        );
        assert_eq!(inner.average_color, RgbColor::WHITE);
        assert!(inner.bright_mask.pixels().all(|p| p.0[0] == 0));
        assert_eq!(inner.image, img);
    }

    #[test]
    fn average_color_samples_brightest_content() {
        let mut img = rebate_with_content(300, 180.0, 0.0);
        // A highlight patch inside the content.
        for y in 140..160 {
            for x in 140..160 {
                img.put_pixel(x, y, Rgb([200, 150, 100]));
            }
        }
        let inner = detect_inner(&img, threshold_of(&img), &InnerConfig::default());
        let avg = inner.average_color;
        assert!((avg.r - 200.0).abs() < 1e-6, "{avg:?}");
        assert!((avg.g - 150.0).abs() < 1e-6, "{avg:?}");
        assert!((avg.b - 100.0).abs() < 1e-6, "{avg:?}");
        let selected = inner.bright_mask.pixels().filter(|p| p.0[0] != 0).count();
        assert_eq!(selected, 400);
    }
}
