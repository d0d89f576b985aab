// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop/deskew applier — rotate the original scan upright and cut out the
// detected frame, with rectangles composed into original-image coordinates.

use image::imageops::crop_imm;
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use negframe_core::Rect;
use tracing::{debug, info, instrument};

/// Fill for pixels exposed by the rotation.
const FILL: Rgb<u8> = Rgb([255, 255, 255]);

/// Angles below this (degrees) are treated as no rotation at all.
const MIN_ROTATION_DEGREES: f64 = 0.01;

/// Compose an inner-crop rectangle found inside the rebate crop into
/// original-image coordinates.
pub fn compose_rect(rebate: Rect, inner: Rect) -> Rect {
    inner.offset_by(rebate.origin())
}

/// Rotate `image` about its centre so content skewed by `angle` degrees
/// (clockwise positive) becomes axis-aligned. Canvas size is unchanged.
pub fn deskew(image: &RgbImage, angle: f64) -> RgbImage {
    if angle.abs() < MIN_ROTATION_DEGREES {
        return image.clone();
    }
    let theta = (-angle).to_radians() as f32;
    rotate_about_center(image, theta, Interpolation::Bilinear, FILL)
}

/// Crop `image` to `rect`, clipped to the image bounds.
pub fn crop(image: &RgbImage, rect: Rect) -> RgbImage {
    let safe = rect.clamp_to(image.width(), image.height());
    if safe != rect {
        debug!(%rect, %safe, "Crop rectangle clipped to image");
    }
    crop_imm(image, safe.x, safe.y, safe.width, safe.height).to_image()
}

/// Deskew the original scan by `angle` degrees, then crop it to `rect`.
///
/// `rect` must already be in original-image coordinates (see [`compose_rect`]).
#[instrument(skip(original), fields(width = original.width(), height = original.height()))]
pub fn apply_crop_and_deskew(original: &RgbImage, rect: Rect, angle: f64) -> RgbImage {
    let rotated = deskew(original, angle);
    let out = crop(&rotated, rect);
    info!(
        angle,
        %rect,
        out_w = out.width(),
        out_h = out.height(),
        "Frame cropped and deskewed"
    );
    out
}
