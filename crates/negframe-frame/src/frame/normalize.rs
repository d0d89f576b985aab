// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Highlight normalization — estimate a reference white from the brightest
// non-black pixels and rescale each channel so the reference lands on a fixed
// target. Corrects the color cast of the scanner light before detection.

use image::{Rgb, RgbImage};
use negframe_core::RgbColor;
use tracing::{debug, info, instrument, warn};

/// Value the reference color is mapped to in every channel.
pub const NORMALIZE_TARGET: f32 = 254.0;

/// Reference used when every pixel has been zeroed by perforation removal.
pub const DEFAULT_REFERENCE: RgbColor = RgbColor::gray(254.0);

/// Reference channels at or below this are treated as empty and zeroed.
const MIN_REFERENCE_CHANNEL: f64 = 1.0;

/// Output of [`normalize_highlights`].
#[derive(Debug, Clone)]
pub struct Normalized {
    /// Channel-rescaled working image, used only for detection.
    pub image: RgbImage,
    /// Mean color of the brightest pixels, before rescaling.
    pub reference: RgbColor,
}

/// Rec. 601 grayscale used to rank highlight candidates.
#[inline]
fn gray(pixel: &Rgb<u8>) -> f32 {
    let Rgb([r, g, b]) = *pixel;
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Mean RGB of the brightest `top_percent`% of non-black pixels.
///
/// Pixels that are black in all channels are ignored. At least one pixel is
/// always selected. Falls back to [`DEFAULT_REFERENCE`] when no candidate is
/// left.
pub fn reference_color(image: &RgbImage, top_percent: f64) -> RgbColor {
    let mut candidates: Vec<(f32, Rgb<u8>)> = image
        .pixels()
        .filter(|p| p.0 != [0, 0, 0])
        .map(|p| (gray(p), *p))
        .collect();

    if candidates.is_empty() {
        warn!("No non-black pixels; using default reference color");
        return DEFAULT_REFERENCE;
    }

    let select = ((candidates.len() as f64 * top_percent / 100.0) as usize)
        .clamp(1, candidates.len());
    // Brightest first; order inside the selection does not matter.
    candidates.select_nth_unstable_by(select - 1, |a, b| b.0.total_cmp(&a.0));

    let mut sums = [0.0f64; 3];
    for (_, pixel) in &candidates[..select] {
        for (sum, channel) in sums.iter_mut().zip(pixel.0) {
            *sum += channel as f64;
        }
    }
    let n = select as f64;
    debug!(candidates = candidates.len(), selected = select, "Highlight candidates ranked");
    RgbColor::from_channels(sums.map(|s| s / n))
}

/// Lookup table rescaling one channel so `reference` maps to [`NORMALIZE_TARGET`].
fn channel_lut(reference: f64) -> [u8; 256] {
    let mut lut = [0u8; 256];
    if reference <= MIN_REFERENCE_CHANNEL {
        return lut;
    }
    let scale = NORMALIZE_TARGET / reference as f32;
    for (value, slot) in lut.iter_mut().enumerate() {
        *slot = (value as f32 * scale).round().clamp(0.0, NORMALIZE_TARGET) as u8;
    }
    lut
}

/// Rescale each channel of `image` by `target / reference`.
///
/// A reference channel of 1 or less zeroes that channel entirely.
pub fn normalize_channels(image: &RgbImage, reference: RgbColor) -> RgbImage {
    let luts = reference.channels().map(channel_lut);
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for (channel, lut) in pixel.0.iter_mut().zip(&luts) {
            *channel = lut[*channel as usize];
        }
    }
    out
}

/// Estimate the highlight reference and normalize the image against it.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn normalize_highlights(image: &RgbImage, top_percent: f64) -> Normalized {
    let reference = reference_color(image, top_percent);
    info!(
        r = reference.r,
        g = reference.g,
        b = reference.b,
        top_percent,
        "Highlight reference color"
    );
    for (name, value) in ["r", "g", "b"].into_iter().zip(reference.channels()) {
        if value <= MIN_REFERENCE_CHANNEL {
            warn!(channel = name, value, "Reference channel near zero; channel zeroed");
        }
    }
    Normalized {
        image: normalize_channels(image, reference),
        reference,
    }
}
