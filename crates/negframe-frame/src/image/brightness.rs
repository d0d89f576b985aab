// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Brightness estimation — per-pixel luminance maps, percentile thresholds and
// binary masks derived from them.

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

/// Per-pixel scalar luminance, same extent as its source image.
pub type BrightnessMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Near-equal channel weights. Deliberately not ITU luma, so skin and film
/// base tones stay comparable across channels.
pub const BRIGHTNESS_WEIGHTS: [f32; 3] = [0.3333, 0.3333, 0.3334];

/// Mask value for pixels that satisfy a predicate.
pub const MASK_ON: u8 = 255;

/// Brightness of a single RGB pixel.
#[inline]
pub fn pixel_brightness(pixel: &Rgb<u8>) -> f32 {
    let Rgb([r, g, b]) = *pixel;
    r as f32 * BRIGHTNESS_WEIGHTS[0]
        + g as f32 * BRIGHTNESS_WEIGHTS[1]
        + b as f32 * BRIGHTNESS_WEIGHTS[2]
}

/// Compute the brightness map of an RGB image.
pub fn compute_brightness(image: &RgbImage) -> BrightnessMap {
    let (width, height) = image.dimensions();
    ImageBuffer::from_fn(width, height, |x, y| {
        Luma([pixel_brightness(image.get_pixel(x, y))])
    })
}

/// Percentile of `values` with linear interpolation between closest ranks.
///
/// `pct` is clamped to [0, 100]. Returns `None` for an empty slice. Only two
/// order statistics are selected, the input is never fully sorted.
pub fn percentile(values: &[f32], pct: f64) -> Option<f32> {
    if values.is_empty() {
        return None;
    }

    let mut scratch = values.to_vec();
    let rank = pct.clamp(0.0, 100.0) / 100.0 * (scratch.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let frac = (rank - lower as f64) as f32;

    let (_, lower_value, above) = scratch.select_nth_unstable_by(lower, |a, b| a.total_cmp(b));
    let lower_value = *lower_value;
    if frac == 0.0 || above.is_empty() {
        return Some(lower_value);
    }

    let upper_value = above.iter().copied().fold(f32::INFINITY, f32::min);
    Some(lower_value + (upper_value - lower_value) * frac)
}

/// Binary mask of pixels whose brightness is at least `threshold`.
pub fn threshold_mask(map: &BrightnessMap, threshold: f32) -> GrayImage {
    let (width, height) = map.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        if map.get_pixel(x, y).0[0] >= threshold {
            Luma([MASK_ON])
        } else {
            Luma([0])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_uses_near_equal_weights() {
        let img = RgbImage::from_pixel(2, 1, Rgb([30, 60, 90]));
        let map = compute_brightness(&img);
        let expected = 30.0 * 0.3333 + 60.0 * 0.3333 + 90.0 * 0.3334;
        assert!((map.get_pixel(1, 0).0[0] - expected).abs() < 1e-3);
    }

    #[test]
    fn brightness_of_gray_is_its_value() {
        let map = compute_brightness(&RgbImage::from_pixel(1, 1, Rgb([200, 200, 200])));
        assert!((map.get_pixel(0, 0).0[0] - 200.0).abs() < 1e-3);
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let values = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 50.0), Some(3.0));
        assert_eq!(percentile(&values, 100.0), Some(5.0));
        let p = percentile(&values, 90.0).unwrap();
        assert!((p - 4.6).abs() < 1e-5, "got {p}");
    }

    #[test]
    fn percentile_of_constant_is_exact() {
        let values = vec![254.0_f32; 17];
        assert_eq!(percentile(&values, 37.5), Some(254.0));
    }

    #[test]
    fn percentile_empty_is_none() {
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn threshold_mask_is_inclusive() {
        let map = BrightnessMap::from_raw(3, 1, vec![9.0, 10.0, 11.0]).unwrap();
        let mask = threshold_mask(&map, 10.0);
        assert_eq!(mask.as_raw(), &vec![0, MASK_ON, MASK_ON]);
    }
}
