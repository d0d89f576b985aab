// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rebate crop detection — locate the bright film rebate (or print border)
// and crop the scan to its outer boundary.

use image::RgbImage;
use image::imageops::crop_imm;
use imageproc::distance_transform::Norm;
use imageproc::morphology::close;
use negframe_core::config::RebateConfig;
use negframe_core::{Detection, FallbackReason, Rect};
use tracing::{debug, info, instrument, warn};

use super::contour::largest_external_contour;
use super::kernel_radius;
use crate::image::brightness::{compute_brightness, percentile, threshold_mask};

/// Output of [`detect_rebate`].
#[derive(Debug, Clone)]
pub struct RebateCrop {
    /// Pixels inside the detected rectangle (the whole input on fallback).
    pub image: RgbImage,
    /// Brightness threshold separating rebate from content. Reused by the
    /// inner detector so both stages agree on what "bright" means.
    pub threshold: f32,
    pub detection: Detection,
}

impl RebateCrop {
    pub fn rect(&self) -> Rect {
        self.detection.rect()
    }
}

/// Find the outer rebate boundary of a normalized scan.
///
/// Pixels at or above the configured brightness percentile are treated as
/// rebate. The mask is closed with a square kernel and the bounding box of its
/// largest external contour becomes the crop. If nothing is found, or the box
/// covers less than `min_area_fraction` of the image, the full image is kept.
#[instrument(skip(image, params), fields(width = image.width(), height = image.height()))]
pub fn detect_rebate(image: &RgbImage, params: &RebateConfig) -> RebateCrop {
    let (width, height) = image.dimensions();
    let full = Rect::full(width, height);

    let brightness = compute_brightness(image);
    let threshold = percentile(brightness.as_raw(), params.brightness_percentile).unwrap_or(0.0);
    debug!(threshold, percentile = params.brightness_percentile, "Rebate threshold");

    let mask = threshold_mask(&brightness, threshold);
    let closed = close(&mask, Norm::LInf, kernel_radius(params.close_kernel));

    let fallback = |reason: FallbackReason| RebateCrop {
        image: image.clone(),
        threshold,
        detection: Detection::Fallback { rect: full, reason },
    };

    let Some(contour) = largest_external_contour(&closed) else {
        warn!("No rebate contour found; keeping full image");
        return fallback(FallbackReason::NoContour);
    };

    let rect = contour.bounding_rect().clamp_to(width, height);
    let min_area = params.min_area_fraction * full.area() as f64;
    if rect.is_empty() || (rect.area() as f64) < min_area {
        warn!(
            %rect,
            crop_area = rect.area(),
            min_area,
            "Rebate crop too small; keeping full image"
        );
        return fallback(FallbackReason::AreaTooSmall);
    }

    info!(%rect, threshold, "Rebate crop detected");
    RebateCrop {
        image: crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image(),
        threshold,
        detection: Detection::Detected { rect, angle: 0.0 },
    }
}
